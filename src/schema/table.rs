//! Table definitions in compact string form.
//!
//! `"++id, type, chain"` declares an auto-incrementing primary key `id`
//! with secondary indexes on `type` and `chain`. `"key"` declares a plain
//! primary key with no indexes.

use crate::error::{Result, StoreError};
use crate::types::{Key, Record};
use serde::{Deserialize, Serialize};

/// Primary key declaration. Keys are always stored inside the record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyDef {
    pub field: String,
    pub auto_increment: bool,
}

/// Shape of one table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub primary_key: PrimaryKeyDef,
    pub indexes: Vec<String>,
}

impl TableDef {
    /// Parse a definition string.
    pub fn parse(name: &str, definition: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            StoreError::InvalidSchema(format!("table '{}' ({:?}): {}", name, definition, reason))
        };

        let mut parts = definition.split(',').map(str::trim);
        let pk = parts.next().unwrap_or_default();

        let (field, auto_increment) = match pk.strip_prefix("++") {
            Some(field) => (field, true),
            None => (pk, false),
        };
        if field.is_empty() {
            return Err(invalid("primary key must name a field"));
        }
        if !is_plain_field(field) {
            return Err(invalid("unsupported primary key syntax"));
        }

        let mut indexes: Vec<String> = Vec::new();
        for index in parts {
            if index.is_empty() {
                return Err(invalid("empty index name"));
            }
            if !is_plain_field(index) {
                return Err(invalid(
                    "compound, unique and multi-entry indexes are not supported",
                ));
            }
            if index == field || indexes.iter().any(|i| i == index) {
                return Err(invalid("duplicate index"));
            }
            indexes.push(index.to_string());
        }

        Ok(Self {
            name: name.to_string(),
            primary_key: PrimaryKeyDef {
                field: field.to_string(),
                auto_increment,
            },
            indexes,
        })
    }

    /// Whether `field` can be used for equality lookups.
    pub fn is_indexed(&self, field: &str) -> bool {
        self.primary_key.field == field || self.indexes.iter().any(|i| i == field)
    }

    /// Read the primary key out of a record.
    pub fn key_of(&self, record: &Record) -> Option<Key> {
        record.get(&self.primary_key.field).and_then(Key::from_value)
    }
}

fn is_plain_field(s: &str) -> bool {
    !s.starts_with(['&', '*', '['])
        && !s.contains(['+', ' '])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_auto_increment() {
        let def = TableDef::parse("wallets", "++id, type, chain, network").unwrap();
        assert_eq!(def.primary_key.field, "id");
        assert!(def.primary_key.auto_increment);
        assert_eq!(def.indexes, vec!["type", "chain", "network"]);
        assert!(def.is_indexed("id"));
        assert!(def.is_indexed("chain"));
        assert!(!def.is_indexed("name"));
    }

    #[test]
    fn test_parse_plain_key() {
        let def = TableDef::parse("settings", "key").unwrap();
        assert_eq!(def.primary_key.field, "key");
        assert!(!def.primary_key.auto_increment);
        assert!(def.indexes.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_definitions() {
        assert!(TableDef::parse("t", "").is_err());
        assert!(TableDef::parse("t", "++").is_err());
        assert!(TableDef::parse("t", "id, &email").is_err());
        assert!(TableDef::parse("t", "id, [a+b]").is_err());
        assert!(TableDef::parse("t", "id, name, name").is_err());
        assert!(TableDef::parse("t", "id, ,name").is_err());
    }

    #[test]
    fn test_key_of() {
        let def = TableDef::parse("nodes", "id").unwrap();
        let record = json!({"id": "abc"}).as_object().cloned().unwrap();
        assert_eq!(def.key_of(&record), Some(Key::from("abc")));
        assert_eq!(def.key_of(&Record::new()), None);
    }
}
