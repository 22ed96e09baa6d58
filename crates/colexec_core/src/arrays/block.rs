use colexec_error::{DbError, ErrorKind, Result};

use super::array::Array;
use super::datatype::DataType;
use super::schema::{NameAndType, NamesAndTypes};

/// A named column inside a block.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnWithName {
    pub name: String,
    pub array: Array,
}

impl ColumnWithName {
    pub fn new(name: impl Into<String>, array: Array) -> Self {
        ColumnWithName {
            name: name.into(),
            array,
        }
    }

    pub fn datatype(&self) -> &DataType {
        self.array.datatype()
    }
}

/// An ordered set of uniquely named columns, all of the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    columns: Vec<ColumnWithName>,
    num_rows: usize,
}

impl Block {
    /// Create an empty block with no columns.
    pub fn empty(num_rows: usize) -> Self {
        Block {
            columns: Vec::new(),
            num_rows,
        }
    }

    /// Create a new block from columns.
    ///
    /// Errors if names collide or columns have differing lengths. A block with
    /// no columns has zero rows.
    pub fn try_new(columns: impl IntoIterator<Item = ColumnWithName>) -> Result<Self> {
        let columns: Vec<_> = columns.into_iter().collect();
        let num_rows = columns.first().map(|c| c.array.len()).unwrap_or(0);

        let mut block = Block::empty(num_rows);
        for column in columns {
            block.push_column(column)?;
        }

        Ok(block)
    }

    /// Create a block from (name, array) pairs.
    pub fn try_from_arrays<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, Array)>,
    ) -> Result<Self> {
        Self::try_new(
            columns
                .into_iter()
                .map(|(name, array)| ColumnWithName::new(name, array)),
        )
    }

    /// Append a column to the end of the block.
    pub fn push_column(&mut self, column: ColumnWithName) -> Result<()> {
        if self.get_by_name(&column.name).is_some() {
            return Err(
                DbError::with_kind(ErrorKind::InvalidName, "Duplicate column name in block")
                    .with_field("name", &column.name),
            );
        }
        if column.array.len() != self.num_rows {
            return Err(
                DbError::with_kind(ErrorKind::SizeMismatch, "Column length differs from block")
                    .with_field("name", &column.name)
                    .with_field("column_len", column.array.len())
                    .with_field("num_rows", self.num_rows),
            );
        }

        self.columns.push(column);
        Ok(())
    }

    /// Append an all-null column of the given type, returning its index.
    ///
    /// Used to reserve the output slot for a function result.
    pub fn insert_placeholder(
        &mut self,
        name: impl Into<String>,
        datatype: &DataType,
    ) -> Result<usize> {
        let array = Array::new_typed_null(datatype, self.num_rows)?;
        self.push_column(ColumnWithName::new(name, array))?;
        Ok(self.columns.len() - 1)
    }

    /// Replace the array at some index, keeping the column name.
    ///
    /// The new array must have the same type and length as the old one.
    pub fn set_column(&mut self, idx: usize, array: Array) -> Result<()> {
        let num_rows = self.num_rows;
        let column = self.columns.get_mut(idx).ok_or_else(|| {
            DbError::new("Column index out of bounds").with_field("idx", idx)
        })?;

        if column.array.datatype() != array.datatype() {
            return Err(DbError::with_kind(
                ErrorKind::IllegalColumn,
                "Replacement column has a different type",
            )
            .with_field("name", &column.name)
            .with_field("expected", column.array.datatype())
            .with_field("got", array.datatype()));
        }
        if array.len() != num_rows {
            return Err(
                DbError::with_kind(ErrorKind::SizeMismatch, "Column length differs from block")
                    .with_field("name", &column.name)
                    .with_field("column_len", array.len())
                    .with_field("num_rows", num_rows),
            );
        }

        column.array = array;
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, idx: usize) -> Option<&ColumnWithName> {
        self.columns.get(idx)
    }

    pub fn try_column(&self, idx: usize) -> Result<&ColumnWithName> {
        self.columns.get(idx).ok_or_else(|| {
            DbError::new("Column index out of bounds")
                .with_field("idx", idx)
                .with_field("num_columns", self.columns.len())
        })
    }

    pub fn get_by_name(&self, name: &str) -> Option<&ColumnWithName> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn columns(&self) -> &[ColumnWithName] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<ColumnWithName> {
        self.columns
    }

    pub fn names_and_types(&self) -> NamesAndTypes {
        self.columns
            .iter()
            .map(|c| NameAndType::new(c.name.clone(), c.datatype().clone()))
            .collect()
    }
}
