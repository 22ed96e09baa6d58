use serde::{Deserialize, Serialize};

use super::datatype::DataType;
use crate::nested::name::extract_table_name;

/// A single named and typed entry in a schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameAndType {
    pub name: String,
    pub datatype: DataType,
}

impl NameAndType {
    pub fn new(name: impl Into<String>, datatype: DataType) -> Self {
        NameAndType {
            name: name.into(),
            datatype,
        }
    }
}

/// Ordered list of names and types describing a block's columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamesAndTypes {
    pub entries: Vec<NameAndType>,
}

impl NamesAndTypes {
    pub fn new<S: Into<String>>(entries: impl IntoIterator<Item = (S, DataType)>) -> Self {
        NamesAndTypes {
            entries: entries
                .into_iter()
                .map(|(name, datatype)| NameAndType::new(name, datatype))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NameAndType> {
        self.entries.iter()
    }

    pub fn push(&mut self, entry: NameAndType) {
        self.entries.push(entry);
    }

    pub fn get(&self, name: &str) -> Option<&NameAndType> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Distinct table names in first-seen order.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in &self.entries {
            let table = extract_table_name(&entry.name);
            if !names.contains(&table) {
                names.push(table);
            }
        }
        names
    }
}

impl FromIterator<NameAndType> for NamesAndTypes {
    fn from_iter<T: IntoIterator<Item = NameAndType>>(iter: T) -> Self {
        NamesAndTypes {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for NamesAndTypes {
    type Item = NameAndType;
    type IntoIter = std::vec::IntoIter<NameAndType>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_first_seen() {
        let schema = NamesAndTypes::new([
            ("n.a", DataType::Int32),
            ("x", DataType::Int32),
            ("n.b", DataType::Utf8),
            ("m.c", DataType::Int32),
        ]);

        assert_eq!(vec!["n", "x", "m"], schema.table_names());
    }

    #[test]
    fn serde_roundtrip_json() {
        let schema = NamesAndTypes::new([("n.a", DataType::list(DataType::Int32))]);
        let json = serde_json::to_string(&schema).unwrap();
        let got: NamesAndTypes = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, got);
    }
}
