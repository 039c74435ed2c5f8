//! Core types for the wallet store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A physical record: a JSON object keyed by field name.
pub type Record = serde_json::Map<String, Value>;

/// Primary key of a record.
///
/// Keys are inbound: the value lives in the record under the table's
/// primary key field and is extracted from it on write.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    Int(i64),
    Text(String),
}

impl Key {
    /// Extract a key from a JSON value. Only integers and strings are keys.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Key::Int),
            Value::String(s) => Some(Key::Text(s.clone())),
            _ => None,
        }
    }

    /// Convert back to the JSON value stored in the record.
    pub fn to_value(&self) -> Value {
        match self {
            Key::Int(i) => Value::from(*i),
            Key::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(i) => Some(*i),
            Key::Text(_) => None,
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "Key({})", i),
            Key::Text(s) => write!(f, "Key({:?})", s),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{}", i),
            Key::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Text(s)
    }
}

/// A set of field changes applied by an update.
///
/// `Some(value)` assigns the field, `None` removes it from the record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Modifications(BTreeMap<String, Option<Value>>);

impl Modifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `field`.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), Some(value.into()));
        self
    }

    /// Remove `field` from the record.
    pub fn remove(mut self, field: impl Into<String>) -> Self {
        self.0.insert(field.into(), None);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, change: Option<Value>) {
        self.0.insert(field.into(), change);
    }

    pub fn get(&self, field: &str) -> Option<&Option<Value>> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<Value>)> {
        self.0.iter()
    }

    /// Apply the changes to `record` in place.
    pub fn apply_to(&self, record: &mut Record) {
        for (field, change) in &self.0 {
            match change {
                Some(value) => {
                    record.insert(field.clone(), value.clone());
                }
                None => {
                    record.remove(field);
                }
            }
        }
    }
}

impl FromIterator<(String, Option<Value>)> for Modifications {
    fn from_iter<I: IntoIterator<Item = (String, Option<Value>)>>(iter: I) -> Self {
        Modifications(iter.into_iter().collect())
    }
}

impl IntoIterator for Modifications {
    type Item = (String, Option<Value>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Option<Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Store statistics.
#[derive(Clone, Debug, Default)]
pub struct StoreStats {
    pub schema_version: u32,
    pub table_count: usize,
    pub record_count: usize,
    pub journal_entries: u64,
}
