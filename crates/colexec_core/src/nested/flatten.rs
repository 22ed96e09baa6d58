use std::sync::Arc;

use colexec_error::{DbError, ErrorKind, Result};
use tracing::trace;

use super::name::try_concatenate_name;
use super::validate::validate_array_sizes;
use crate::arrays::array::Array;
use crate::arrays::array::array_data::{ArrayData, ListStorage};
use crate::arrays::block::{Block, ColumnWithName};
use crate::arrays::datatype::{DataType, StructField};
use crate::arrays::schema::{NameAndType, NamesAndTypes};
use crate::config::ExecutionConfig;

/// Get the struct fields if the type is a list of a non-empty struct.
fn flattenable_fields(datatype: &DataType) -> Option<&[StructField]> {
    let fields = datatype.list_element_type()?.struct_fields()?;
    if fields.is_empty() {
        None
    } else {
        Some(fields)
    }
}

/// Replace every list of struct column with one list column per struct field.
///
/// The new columns are named `column.field` and all share the offsets and
/// list validity of the original column. A null struct element becomes a
/// null element in every sibling. Other columns pass through in place.
///
/// Array sizes of the input are validated first, and the block is left
/// untouched on error.
pub fn flatten(block: &Block) -> Result<Block> {
    validate_array_sizes(block)?;

    if !block
        .columns()
        .iter()
        .any(|c| flattenable_fields(c.datatype()).is_some())
    {
        return Ok(block.clone());
    }

    let mut columns = Vec::with_capacity(block.num_columns());
    for column in block.columns() {
        match flattenable_fields(column.datatype()) {
            Some(fields) => {
                trace!(column = %column.name, fields = fields.len(), "flattening column");
                flatten_column(column, fields, &mut columns)?;
            }
            None => columns.push(column.clone()),
        }
    }

    let mut out = Block::empty(block.num_rows());
    for column in columns {
        out.push_column(column)?;
    }

    Ok(out)
}

/// Flatten a block, optionally validating the output as configured.
pub fn flatten_with_config(block: &Block, config: &ExecutionConfig) -> Result<Block> {
    let out = flatten(block)?;
    if config.validate_nested_sizes_after_flatten {
        validate_array_sizes(&out)?;
    }
    Ok(out)
}

fn flatten_column(
    column: &ColumnWithName,
    fields: &[StructField],
    out: &mut Vec<ColumnWithName>,
) -> Result<()> {
    let list_array = column.array.materialize()?;
    let list = list_array.try_as_list()?;
    let struct_array = list.child().materialize()?;
    let struct_storage = struct_array.try_as_struct()?;

    if struct_storage.children().len() != fields.len() {
        return Err(DbError::new("Struct children don't match struct fields")
            .with_field("column", &column.name)
            .with_field("children", struct_storage.children().len())
            .with_field("fields", fields.len()));
    }

    for (field, child) in fields.iter().zip(struct_storage.children()) {
        let name = try_concatenate_name(&column.name, &field.name)?;

        let validity = child.validity().intersect(struct_array.validity())?;
        let child = child.clone().with_validity(validity)?;

        let array = Array {
            datatype: DataType::list(field.datatype.clone()),
            validity: list_array.validity().clone(),
            data: ArrayData::List(ListStorage {
                offsets: Arc::clone(list.shared_offsets()),
                child: Arc::new(child),
            }),
        };

        out.push(ColumnWithName::new(name, array));
    }

    Ok(())
}

/// Flatten a schema the same way `flatten` flattens a block.
pub fn flatten_schema(schema: &NamesAndTypes) -> Result<NamesAndTypes> {
    let mut out = NamesAndTypes::default();

    for entry in schema.iter() {
        match flattenable_fields(&entry.datatype) {
            Some(fields) => {
                for field in fields {
                    let name = try_concatenate_name(&entry.name, &field.name)?;
                    out.push(NameAndType::new(name, DataType::list(field.datatype.clone())));
                }
            }
            None => out.push(entry.clone()),
        }
    }

    for (idx, entry) in out.entries.iter().enumerate() {
        if out.entries[..idx].iter().any(|e| e.name == entry.name) {
            return Err(DbError::with_kind(
                ErrorKind::InvalidName,
                "Flattened schema contains duplicate names",
            )
            .with_field("name", &entry.name));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::array::validity::Validity;
    use crate::arrays::datatype::StructTypeMeta;
    use crate::arrays::testutil::{assert_arrays_eq, assert_blocks_eq};

    /// List of struct {a: Int32, b: Utf8} with rows [[(1, x), (2, y)], [], [(3, z)]].
    fn nested_column() -> Array {
        let structs = Array::try_new_struct(
            [
                ("a", Array::from_iter([1_i32, 2, 3])),
                ("b", Array::from_iter(["x", "y", "z"])),
            ],
            3,
        )
        .unwrap();
        Array::try_new_list(structs, vec![0, 2, 2, 3]).unwrap()
    }

    #[test]
    fn flatten_list_of_struct() {
        let block = Block::try_from_arrays([
            ("id", Array::from_iter([10_i64, 20, 30])),
            ("n", nested_column()),
            ("x", Array::from_iter([1_i32, 2, 3])),
        ])
        .unwrap();

        let out = flatten(&block).unwrap();

        let names: Vec<_> = out.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(vec!["id", "n.a", "n.b", "x"], names);

        let expected_a =
            Array::try_new_list(Array::from_iter([1_i32, 2, 3]), vec![0, 2, 2, 3]).unwrap();
        let expected_b =
            Array::try_new_list(Array::from_iter(["x", "y", "z"]), vec![0, 2, 2, 3]).unwrap();
        assert_arrays_eq(&expected_a, &out.column(1).unwrap().array);
        assert_arrays_eq(&expected_b, &out.column(2).unwrap().array);
    }

    #[test]
    fn siblings_share_offsets() {
        let block = Block::try_from_arrays([("n", nested_column())]).unwrap();
        let out = flatten(&block).unwrap();

        let a = out.column(0).unwrap().array.try_as_list().unwrap();
        let b = out.column(1).unwrap().array.try_as_list().unwrap();
        assert!(Arc::ptr_eq(a.shared_offsets(), b.shared_offsets()));

        let orig = block.column(0).unwrap().array.try_as_list().unwrap();
        assert!(Arc::ptr_eq(orig.shared_offsets(), a.shared_offsets()));
    }

    #[test]
    fn flatten_offsets_copy_on_write() {
        let block = Block::try_from_arrays([("n", nested_column())]).unwrap();
        let out = flatten(&block).unwrap();

        let mut a = out.column(0).unwrap().array.clone();
        match a.data_mut() {
            ArrayData::List(list) => list.offsets_mut()[3] = 2,
            _ => unreachable!(),
        }

        let b = out.column(1).unwrap().array.try_as_list().unwrap();
        assert_eq!(&[0, 2, 2, 3], b.offsets());
    }

    #[test]
    fn null_struct_element_propagates() {
        let structs = Array::try_new_struct(
            [
                ("a", Array::from_iter([1_i32, 2])),
                ("b", Array::from_iter([Some(5_i64), None])),
            ],
            2,
        )
        .unwrap()
        .with_validity(Validity::from_iter([false, true]))
        .unwrap();
        let list = Array::try_new_list(structs, vec![0, 2]).unwrap();
        let block = Block::try_from_arrays([("n", list)]).unwrap();

        let out = flatten(&block).unwrap();

        let expected_a =
            Array::try_new_list(Array::from_iter([None, Some(2_i32)]), vec![0, 2]).unwrap();
        let expected_b =
            Array::try_new_list(Array::from_iter([None::<i64>, None]), vec![0, 2]).unwrap();
        assert_arrays_eq(&expected_a, &out.column(0).unwrap().array);
        assert_arrays_eq(&expected_b, &out.column(1).unwrap().array);
    }

    #[test]
    fn flatten_already_flat_is_unchanged() {
        let block = Block::try_from_arrays([
            ("id", Array::from_iter([1_i32, 2])),
            ("s", Array::from_iter(["a", "b"])),
        ])
        .unwrap();

        let out = flatten(&block).unwrap();
        assert_blocks_eq(&block, &out);

        let again = flatten(&out).unwrap();
        assert_blocks_eq(&out, &again);
    }

    #[test]
    fn flatten_is_idempotent_after_first_pass() {
        let block = Block::try_from_arrays([("n", nested_column())]).unwrap();
        let once = flatten(&block).unwrap();
        let twice = flatten(&once).unwrap();
        assert_blocks_eq(&once, &twice);
    }

    #[test]
    fn flatten_zero_rows() {
        let dt = DataType::list(DataType::Struct(StructTypeMeta::new([
            ("a", DataType::Int32),
            ("b", DataType::Utf8),
        ])));
        let block =
            Block::try_from_arrays([("n", Array::new_typed_null(&dt, 0).unwrap())]).unwrap();

        let out = flatten(&block).unwrap();
        assert_eq!(0, out.num_rows());
        assert_eq!(2, out.num_columns());
        assert_eq!(
            &DataType::list(DataType::Utf8),
            out.column(1).unwrap().datatype()
        );
    }

    #[test]
    fn flatten_zero_field_struct_passes_through() {
        let structs = Array::try_new_struct(Vec::<(String, Array)>::new(), 2).unwrap();
        let list = Array::try_new_list(structs, vec![0, 1, 2]).unwrap();
        let block = Block::try_from_arrays([("n", list)]).unwrap();

        let out = flatten(&block).unwrap();
        assert_blocks_eq(&block, &out);
    }

    #[test]
    fn flatten_constant_list() {
        let constant = Array::new_constant(nested_column().select(&[0]).unwrap(), 2).unwrap();
        let block = Block::try_from_arrays([("n", constant)]).unwrap();

        let out = flatten(&block).unwrap();
        let expected_a =
            Array::try_new_list(Array::from_iter([1_i32, 2, 1, 2]), vec![0, 2, 4]).unwrap();
        assert_arrays_eq(&expected_a, &out.column(0).unwrap().array);
    }

    #[test]
    fn flatten_name_collision() {
        let block = Block::try_from_arrays([
            ("n", nested_column()),
            ("n.a", Array::from_iter([1_i32, 2, 3])),
        ])
        .unwrap();

        let err = flatten(&block).unwrap_err();
        assert_eq!(ErrorKind::InvalidName, err.kind());
    }

    #[test]
    fn flatten_rejects_dotted_field() {
        let structs = Array::try_new_struct([("a.b", Array::from_iter([1_i32]))], 1).unwrap();
        let list = Array::try_new_list(structs, vec![0, 1]).unwrap();
        let block = Block::try_from_arrays([("n", list)]).unwrap();

        let err = flatten(&block).unwrap_err();
        assert_eq!(ErrorKind::InvalidName, err.kind());
    }

    #[test]
    fn flatten_rejects_dotted_column_name() {
        let block = Block::try_from_arrays([("a.n", nested_column())]).unwrap();

        let err = flatten(&block).unwrap_err();
        assert_eq!(ErrorKind::InvalidName, err.kind());

        let err = flatten_schema(&block.names_and_types()).unwrap_err();
        assert_eq!(ErrorKind::InvalidName, err.kind());
    }

    #[test]
    fn flatten_rejects_empty_field_name() {
        let structs = Array::try_new_struct([("", Array::from_iter([1_i32]))], 1).unwrap();
        let list = Array::try_new_list(structs, vec![0, 1]).unwrap();
        let block = Block::try_from_arrays([("n", list)]).unwrap();

        let err = flatten(&block).unwrap_err();
        assert_eq!(ErrorKind::InvalidName, err.kind());

        let err = flatten_schema(&block.names_and_types()).unwrap_err();
        assert_eq!(ErrorKind::InvalidName, err.kind());
    }

    #[test]
    fn flatten_validates_input_first() {
        let block = Block::try_from_arrays([
            (
                "g.a",
                Array::try_new_list(Array::from_iter([1_i32, 2]), vec![0, 1, 2]).unwrap(),
            ),
            (
                "g.b",
                Array::try_new_list(Array::from_iter([1_i32, 2]), vec![0, 2, 2]).unwrap(),
            ),
            ("n", nested_column().select(&[0, 1]).unwrap()),
        ])
        .unwrap();

        let err = flatten(&block).unwrap_err();
        assert_eq!(ErrorKind::SizeMismatch, err.kind());
    }

    #[test]
    fn flatten_schema_matches_block() {
        let block = Block::try_from_arrays([
            ("id", Array::from_iter([10_i64, 20, 30])),
            ("n", nested_column()),
        ])
        .unwrap();

        let from_block = flatten(&block).unwrap().names_and_types();
        let from_schema = flatten_schema(&block.names_and_types()).unwrap();
        assert_eq!(from_block, from_schema);
    }

    #[test]
    fn flatten_with_config_validates_output() {
        let block = Block::try_from_arrays([("n", nested_column())]).unwrap();
        let config = ExecutionConfig {
            validate_nested_sizes_after_flatten: true,
            ..Default::default()
        };

        let out = flatten_with_config(&block, &config).unwrap();
        assert_eq!(2, out.num_columns());
    }
}
