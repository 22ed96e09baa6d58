use std::collections::HashSet;
use std::sync::Arc;

use colexec_error::Result;
use indexmap::IndexMap;
use tracing::trace;

use super::name::split_name;
use super::validate::validate_array_sizes;
use crate::arrays::array::Array;
use crate::arrays::array::array_data::ListStorage;
use crate::arrays::block::{Block, ColumnWithName};
use crate::arrays::datatype::{DataType, StructTypeMeta};
use crate::arrays::schema::{NameAndType, NamesAndTypes};

/// Position of an entry in the collected output.
enum Slot<'a> {
    Passthrough(usize),
    Group(&'a str),
}

/// (index, name, datatype) of a schema entry or block column.
type Entry<'a> = (usize, &'a str, &'a DataType);

/// (index, field name, element type) of a member of a nested group.
type Member<'a> = (usize, &'a str, &'a DataType);

/// Split a list typed name into its table, field and element type, if it's a
/// nested member.
fn nested_member<'a>(
    name: &'a str,
    datatype: &'a DataType,
) -> Option<(&'a str, &'a str, &'a DataType)> {
    let element = datatype.list_element_type()?;
    let (table, field) = split_name(name);
    if table.is_empty() || field.is_empty() {
        return None;
    }
    Some((table, field, element))
}

/// Group entries into slots, returning the slots in output order and the
/// members of each group in first-seen order.
///
/// A group whose table name is already used by a column that isn't collected
/// is left as is, its members pass through unchanged.
fn group_entries<'a>(
    entries: &[Entry<'a>],
) -> (Vec<Slot<'a>>, IndexMap<&'a str, Vec<Member<'a>>>) {
    let taken: HashSet<&str, ahash::RandomState> = entries
        .iter()
        .filter(|(_, name, datatype)| nested_member(name, datatype).is_none())
        .map(|&(_, name, _)| name)
        .collect();

    let mut slots = Vec::new();
    let mut groups: IndexMap<&str, Vec<Member>> = IndexMap::new();

    for &(idx, name, datatype) in entries {
        match nested_member(name, datatype) {
            Some((table, field, element)) if !taken.contains(table) => {
                let members = groups.entry(table).or_default();
                if members.is_empty() {
                    slots.push(Slot::Group(table));
                }
                members.push((idx, field, element));
            }
            Some((table, _, _)) => {
                trace!(%table, %name, "nested table name already in use, not collecting");
                slots.push(Slot::Passthrough(idx));
            }
            None => slots.push(Slot::Passthrough(idx)),
        }
    }

    (slots, groups)
}

/// Regroup dotted list entries into one list of struct entry per table.
///
/// Struct field order follows the order the entries are first seen in. The
/// collected entry takes the position of the first member of its group.
/// Entries without a dot, and dotted entries that aren't lists, pass through
/// unchanged. So do the members of a group whose table name is already the
/// name of a passed through entry.
pub fn collect(schema: &NamesAndTypes) -> NamesAndTypes {
    let entries: Vec<Entry> = schema
        .entries
        .iter()
        .enumerate()
        .map(|(idx, e)| (idx, e.name.as_str(), &e.datatype))
        .collect();
    let (slots, groups) = group_entries(&entries);

    slots
        .into_iter()
        .map(|slot| match slot {
            Slot::Passthrough(idx) => schema.entries[idx].clone(),
            Slot::Group(table) => {
                let fields = groups[table]
                    .iter()
                    .map(|&(_, field, element)| (field, element.clone()));
                NameAndType::new(
                    table,
                    DataType::list(DataType::Struct(StructTypeMeta::new(fields))),
                )
            }
        })
        .collect()
}

/// Regroup dotted list columns of a block into list of struct columns.
///
/// This is the data level inverse of `flatten`. Array sizes are validated
/// first. Member columns that don't share offsets with the first member of
/// their group are compacted so that all struct fields line up.
pub fn collect_block(block: &Block) -> Result<Block> {
    validate_array_sizes(block)?;

    let entries: Vec<Entry> = block
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, c)| (idx, c.name.as_str(), c.datatype()))
        .collect();
    let (slots, groups) = group_entries(&entries);

    let mut out = Block::empty(block.num_rows());
    for slot in slots {
        match slot {
            Slot::Passthrough(idx) => out.push_column(block.try_column(idx)?.clone())?,
            Slot::Group(table) => {
                trace!(%table, members = groups[table].len(), "collecting nested columns");
                let array = collect_group(block, &groups[table])?;
                out.push_column(ColumnWithName::new(table, array))?;
            }
        }
    }

    Ok(out)
}

fn collect_group(block: &Block, members: &[Member]) -> Result<Array> {
    let mut offsets: Option<Arc<Vec<i32>>> = None;
    let mut validity = None;
    let mut fields = Vec::with_capacity(members.len());

    for &(idx, field, _) in members {
        let array = block.try_column(idx)?.array.materialize()?;
        let list = array.try_as_list()?;
        let (list_offsets, child) = compact_list(list)?;

        match &offsets {
            Some(existing) => {
                // Sizes are validated, compacted offsets are equal.
                debug_assert_eq!(existing.as_slice(), list_offsets.as_slice());
            }
            None => offsets = Some(list_offsets),
        }

        validity = Some(match validity {
            Some(v) => array.validity().intersect(&v)?,
            None => array.validity().clone(),
        });

        fields.push((field, child));
    }

    let offsets = offsets.unwrap_or_else(|| Arc::new(vec![0; block.num_rows() + 1]));
    let child_len = offsets.last().copied().unwrap_or(0) as usize;
    let structs = Array::try_new_struct(fields, child_len)?;

    let array = Array::try_new_list(structs, offsets)?;
    match validity {
        Some(validity) => array.with_validity(validity),
        None => Ok(array),
    }
}

/// Get offsets starting at zero covering the entire child, selecting child
/// rows if needed.
fn compact_list(list: &ListStorage) -> Result<(Arc<Vec<i32>>, Array)> {
    let offsets = list.offsets();
    let first = offsets.first().copied().unwrap_or(0);
    let last = offsets.last().copied().unwrap_or(0);

    if first == 0 && last as usize == list.child().len() {
        return Ok((Arc::clone(list.shared_offsets()), list.child().clone()));
    }

    let selection: Vec<usize> = (first as usize..last as usize).collect();
    let child = list.child().select(&selection)?;
    let compacted = offsets.iter().map(|&o| o - first).collect();

    Ok((Arc::new(compacted), child))
}
