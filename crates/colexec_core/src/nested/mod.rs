//! Conversion between nested list of struct columns and flat sibling list
//! columns.

pub mod collect;
pub mod flatten;
pub mod name;
pub mod validate;

pub use collect::{collect, collect_block};
pub use flatten::{flatten, flatten_schema, flatten_with_config};
pub use name::{concatenate_name, extract_table_name, split_name};
pub use validate::validate_array_sizes;
