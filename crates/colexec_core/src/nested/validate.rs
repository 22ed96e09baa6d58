use colexec_error::{DbError, ErrorKind, Result};
use indexmap::IndexMap;
use tracing::trace;

use super::name::{extract_table_name, is_nested_name};
use crate::arrays::array::Array;
use crate::arrays::array::array_data::ArrayData;
use crate::arrays::block::Block;

/// Per-row element counts of a list array.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RowLengths<'a> {
    Offsets(&'a [i32]),
    /// Every row has the same number of elements.
    Constant(usize),
}

impl RowLengths<'_> {
    pub(crate) fn get(&self, idx: usize) -> usize {
        match self {
            Self::Offsets(offsets) => (offsets[idx + 1] - offsets[idx]) as usize,
            Self::Constant(len) => *len,
        }
    }
}

pub(crate) fn row_lengths(array: &Array) -> Result<RowLengths<'_>> {
    match array.data() {
        ArrayData::List(list) => Ok(RowLengths::Offsets(list.offsets())),
        ArrayData::Constant(c) => {
            let list = c.value().try_as_list()?;
            Ok(RowLengths::Constant(list.row_len(0)))
        }
        other => Err(DbError::with_kind(
            ErrorKind::IllegalColumn,
            "Expected a list column for row lengths",
        )
        .with_field("column", other.kind_name())),
    }
}

/// Check that all list columns belonging to the same nested table have the
/// same number of elements in every row.
///
/// Columns belong to the same table when their names share the part before
/// the first dot. Only list typed columns with a dotted name take part.
/// Returns a `SizeMismatch` error for the first row that differs.
pub fn validate_array_sizes(block: &Block) -> Result<()> {
    let mut groups: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (idx, column) in block.columns().iter().enumerate() {
        if column.datatype().is_list() && is_nested_name(&column.name) {
            groups
                .entry(extract_table_name(&column.name))
                .or_default()
                .push(idx);
        }
    }

    for (table, indices) in &groups {
        let Some((&first_idx, rest)) = indices.split_first() else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }

        trace!(%table, columns = indices.len(), "validating nested array sizes");

        let first = block.try_column(first_idx)?;
        let first_lengths = row_lengths(&first.array)?;

        for &other_idx in rest {
            let other = block.try_column(other_idx)?;
            let other_lengths = row_lengths(&other.array)?;

            for row in 0..block.num_rows() {
                let left = first_lengths.get(row);
                let right = other_lengths.get(row);
                if left != right {
                    return Err(DbError::with_kind(
                        ErrorKind::SizeMismatch,
                        format!(
                            "Elements '{}' and '{}' of nested table '{table}' have different array sizes",
                            first.name, other.name
                        ),
                    )
                    .with_field("left", &first.name)
                    .with_field("right", &other.name)
                    .with_field("row", row)
                    .with_field("left_size", left)
                    .with_field("right_size", right));
                }
            }
        }
    }

    Ok(())
}
