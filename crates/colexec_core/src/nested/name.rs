//! Dotted names for fields of nested columns.
//!
//! A field `b` of a nested column `a` is stored as a flat column named `a.b`.
//! No escaping is done. A field name that already contains a dot can't be
//! told apart from a nested path, so `split_name` only inverts
//! `concatenate_name` when the field has no dot and the table is non-empty.

use colexec_error::{DbError, ErrorKind, Result};

/// Separator between the table and field parts of a nested name.
pub const NESTED_SEPARATOR: char = '.';

/// Build the flat name for `field` inside `table`.
///
/// Returns `field` unchanged when `table` is empty.
pub fn concatenate_name(table: &str, field: &str) -> String {
    if table.is_empty() {
        return field.to_string();
    }

    let mut name = String::with_capacity(table.len() + 1 + field.len());
    name.push_str(table);
    name.push(NESTED_SEPARATOR);
    name.push_str(field);
    name
}

/// Like `concatenate_name`, but errors if the result couldn't be split back
/// into the same parts.
///
/// Both parts must be non-empty and neither may contain the separator.
pub fn try_concatenate_name(table: &str, field: &str) -> Result<String> {
    if table.is_empty() {
        return Err(DbError::with_kind(
            ErrorKind::InvalidName,
            "Nested table name must not be empty",
        )
        .with_field("field", field));
    }
    if table.contains(NESTED_SEPARATOR) {
        return Err(DbError::with_kind(
            ErrorKind::InvalidName,
            "Nested table name must not contain the separator",
        )
        .with_field("table", table)
        .with_field("field", field));
    }
    if field.is_empty() {
        return Err(DbError::with_kind(
            ErrorKind::InvalidName,
            "Nested field name must not be empty",
        )
        .with_field("table", table));
    }
    if field.contains(NESTED_SEPARATOR) {
        return Err(DbError::with_kind(
            ErrorKind::InvalidName,
            "Nested field name must not contain the separator",
        )
        .with_field("table", table)
        .with_field("field", field));
    }

    Ok(concatenate_name(table, field))
}

/// Split a name into its table and field parts at the first dot.
///
/// Names without a dot have an empty table part. The field part may itself
/// contain dots.
pub fn split_name(name: &str) -> (&str, &str) {
    match name.split_once(NESTED_SEPARATOR) {
        Some((table, field)) => (table, field),
        None => ("", name),
    }
}

/// Get the table part of a name, or the whole name if there's no dot.
pub fn extract_table_name(name: &str) -> &str {
    match name.split_once(NESTED_SEPARATOR) {
        Some((table, _)) => table,
        None => name,
    }
}

/// If the name refers to a field inside a nested table.
pub fn is_nested_name(name: &str) -> bool {
    name.contains(NESTED_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use rand::distr::{Alphanumeric, SampleString};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn concatenate_basic() {
        assert_eq!("n.a", concatenate_name("n", "a"));
        assert_eq!("a", concatenate_name("", "a"));
        assert_eq!("n.a.b", concatenate_name("n", "a.b"));
    }

    #[test]
    fn split_basic() {
        assert_eq!(("n", "a"), split_name("n.a"));
        assert_eq!(("", "a"), split_name("a"));
        assert_eq!(("n", "a.b"), split_name("n.a.b"));
        assert_eq!(("", ""), split_name(""));
    }

    #[test]
    fn extract_table() {
        assert_eq!("n", extract_table_name("n.a"));
        assert_eq!("n", extract_table_name("n.a.b"));
        assert_eq!("x", extract_table_name("x"));
    }

    #[test]
    fn dotted_field_is_not_invertible() {
        let name = concatenate_name("n", "a.b");
        assert_eq!(("n", "a.b"), split_name(&name));

        let name = concatenate_name("", "a.b");
        assert_eq!(("a", "b"), split_name(&name));
    }

    #[test]
    fn try_concatenate_rejects_dotted_field() {
        let err = try_concatenate_name("n", "a.b").unwrap_err();
        assert_eq!(ErrorKind::InvalidName, err.kind());

        let err = try_concatenate_name("", "a").unwrap_err();
        assert_eq!(ErrorKind::InvalidName, err.kind());

        assert_eq!("n.a", try_concatenate_name("n", "a").unwrap());
    }

    #[test]
    fn try_concatenate_rejects_dotted_table() {
        // Would split back as ("a", "n.x").
        let err = try_concatenate_name("a.n", "x").unwrap_err();
        assert_eq!(ErrorKind::InvalidName, err.kind());
        assert_eq!(Some("a.n"), err.get_field("table"));
    }

    #[test]
    fn try_concatenate_rejects_empty_field() {
        let err = try_concatenate_name("n", "").unwrap_err();
        assert_eq!(ErrorKind::InvalidName, err.kind());
    }

    #[test]
    fn try_concatenate_roundtrip_random() {
        let mut rng = ChaCha8Rng::seed_from_u64(0xbeef);

        for _ in 0..1000 {
            let table_len = rng.random_range(0..8);
            let field_len = rng.random_range(0..8);
            let mut table = Alphanumeric.sample_string(&mut rng, table_len);
            let mut field = Alphanumeric.sample_string(&mut rng, field_len);
            if rng.random_bool(0.2) {
                table.insert(rng.random_range(0..=table.len()), NESTED_SEPARATOR);
            }
            if rng.random_bool(0.2) {
                field.insert(rng.random_range(0..=field.len()), NESTED_SEPARATOR);
            }

            match try_concatenate_name(&table, &field) {
                Ok(name) => assert_eq!((table.as_str(), field.as_str()), split_name(&name)),
                Err(err) => assert_eq!(ErrorKind::InvalidName, err.kind()),
            }
        }
    }

    #[test]
    fn split_concatenate_roundtrip_random() {
        let mut rng = ChaCha8Rng::seed_from_u64(0xc0ffee);

        for _ in 0..1000 {
            let table_len = rng.random_range(1..12);
            let field_len = rng.random_range(0..12);
            let table = Alphanumeric.sample_string(&mut rng, table_len);
            let field = Alphanumeric.sample_string(&mut rng, field_len);

            let name = concatenate_name(&table, &field);
            assert_eq!((table.as_str(), field.as_str()), split_name(&name));
            assert_eq!(table, extract_table_name(&name));
        }
    }

    #[test]
    fn split_without_prefix_random() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..1000 {
            let len = rng.random_range(0..16);
            let field = Alphanumeric.sample_string(&mut rng, len);
            assert_eq!(("", field.as_str()), split_name(&field));
        }
    }
}
