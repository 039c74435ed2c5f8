//! In-memory table contents.

use crate::error::{Result, StoreError};
use crate::schema::TableDef;
use crate::types::{Key, Record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Records of one table, ordered by primary key.
#[derive(Clone, Debug)]
pub struct TableData {
    def: TableDef,
    records: BTreeMap<Key, Record>,
    /// Next auto-increment id.
    next_id: i64,
}

impl TableData {
    pub fn new(def: TableDef) -> Self {
        Self {
            def,
            records: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn def(&self) -> &TableDef {
        &self.def
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Replace the index list. The primary key cannot change.
    pub(crate) fn redefine(&mut self, def: TableDef) -> Result<()> {
        if def.primary_key != self.def.primary_key {
            return Err(StoreError::InvalidSchema(format!(
                "table '{}' cannot change its primary key from '{}' to '{}'",
                self.def.name, self.def.primary_key.field, def.primary_key.field
            )));
        }
        self.def = def;
        Ok(())
    }

    /// Resolve the key of `record`, assigning the next auto-increment id
    /// when the table allows it and the record has none.
    ///
    /// In an auto-increment table an integer key must leave room for the
    /// next id, so `i64::MAX` is rejected.
    pub fn assign_key(&self, record: &mut Record) -> Result<Key> {
        let field = &self.def.primary_key.field;
        let auto_increment = self.def.primary_key.auto_increment;

        let key = match record.get(field).and_then(Key::from_value) {
            Some(key) => key,
            None => {
                let absent = record.get(field).map_or(true, |v| v.is_null());
                if !(auto_increment && absent) {
                    return Err(StoreError::MissingPrimaryKey {
                        table: self.def.name.clone(),
                        field: field.clone(),
                    });
                }
                let key = Key::Int(self.next_id);
                record.insert(field.clone(), key.to_value());
                key
            }
        };

        if let Key::Int(id) = key {
            if auto_increment && id.checked_add(1).is_none() {
                return Err(StoreError::KeyOutOfRange {
                    table: self.def.name.clone(),
                    key,
                });
            }
        }
        Ok(key)
    }

    pub fn get(&self, key: &Key) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.records.contains_key(key)
    }

    /// Insert or replace a record whose key field is already set.
    pub fn put(&mut self, mut record: Record) -> Result<Key> {
        let key = self.assign_key(&mut record)?;
        if let Key::Int(id) = key {
            if self.def.primary_key.auto_increment && id >= self.next_id {
                self.next_id = id + 1;
            }
        }
        self.records.insert(key.clone(), record);
        Ok(key)
    }

    pub fn remove(&mut self, key: &Key) -> Option<Record> {
        self.records.remove(key)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn keys(&self) -> Vec<Key> {
        self.records.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Record)> {
        self.records.iter()
    }

    pub(crate) fn get_mut(&mut self, key: &Key) -> Option<&mut Record> {
        self.records.get_mut(key)
    }
}

/// All tables plus the schema version they conform to.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    version: u32,
    tables: BTreeMap<String, TableData>,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub(crate) fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    pub fn table(&self, name: &str) -> Result<&TableData> {
        self.tables
            .get(name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut TableData> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    /// Create `def.name`, or update its indexes if it already exists.
    pub(crate) fn define(&mut self, def: TableDef) -> Result<()> {
        match self.tables.get_mut(&def.name) {
            Some(table) => table.redefine(def),
            None => {
                self.tables.insert(def.name.clone(), TableData::new(def));
                Ok(())
            }
        }
    }

    pub(crate) fn drop_table(&mut self, name: &str) -> bool {
        self.tables.remove(name).is_some()
    }

    pub fn record_count(&self) -> usize {
        self.tables.values().map(TableData::len).sum()
    }

    pub(crate) fn to_persisted(&self) -> PersistedTables {
        PersistedTables {
            tables: self
                .tables
                .values()
                .map(|t| PersistedTable {
                    def: t.def.clone(),
                    next_id: t.next_id,
                    records: t.records.values().cloned().collect(),
                })
                .collect(),
        }
    }

    pub(crate) fn from_persisted(version: u32, persisted: PersistedTables) -> Result<Self> {
        let mut tables = BTreeMap::new();
        for table in persisted.tables {
            let mut data = TableData::new(table.def);
            for record in table.records {
                let key = data.def.key_of(&record).ok_or_else(|| {
                    StoreError::Corruption(format!("record without key in table '{}'", data.def.name))
                })?;
                data.records.insert(key, record);
            }
            data.next_id = table.next_id;
            tables.insert(data.def.name.clone(), data);
        }
        Ok(Self { version, tables })
    }
}

/// On-disk form of [`Tables`]. Keys are rebuilt from the records on load.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PersistedTables {
    tables: Vec<PersistedTable>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedTable {
    def: TableDef,
    next_id: i64,
    records: Vec<Record>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_auto_increment() {
        let mut table = TableData::new(TableDef::parse("wallets", "++id, type").unwrap());
        let a = table.put(record(json!({"type": "local"}))).unwrap();
        let b = table.put(record(json!({"type": "custom"}))).unwrap();
        assert_eq!(a, Key::Int(1));
        assert_eq!(b, Key::Int(2));
        assert_eq!(table.get(&b).unwrap().get("id"), Some(&json!(2)));

        // Explicit ids move the counter forward.
        table.put(record(json!({"id": 10}))).unwrap();
        assert_eq!(table.put(Record::new()).unwrap(), Key::Int(11));
    }

    #[test]
    fn test_largest_id_rejected() {
        let mut table = TableData::new(TableDef::parse("wallets", "++id, type").unwrap());
        let err = table.put(record(json!({"id": i64::MAX}))).unwrap_err();
        assert!(matches!(err, StoreError::KeyOutOfRange { .. }));

        // The counter is untouched and the id below the limit still fits.
        table.put(record(json!({"id": i64::MAX - 1}))).unwrap();
        assert_eq!(table.len(), 1);
        let err = table.put(Record::new()).unwrap_err();
        assert!(matches!(err, StoreError::KeyOutOfRange { .. }));
    }

    #[test]
    fn test_missing_key() {
        let mut table = TableData::new(TableDef::parse("settings", "key").unwrap());
        let err = table.put(record(json!({"value": 1}))).unwrap_err();
        assert!(matches!(err, StoreError::MissingPrimaryKey { .. }));
    }

    #[test]
    fn test_redefine_keeps_primary_key() {
        let mut tables = Tables::new();
        tables.define(TableDef::parse("nodes", "id").unwrap()).unwrap();
        tables.define(TableDef::parse("nodes", "id, hasSynced").unwrap()).unwrap();
        assert_eq!(tables.table("nodes").unwrap().def().indexes, vec!["hasSynced"]);

        let err = tables.define(TableDef::parse("nodes", "++id").unwrap()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidSchema(_)));
    }

    #[test]
    fn test_persisted_roundtrip_keeps_counter() {
        let mut tables = Tables::new();
        tables.define(TableDef::parse("wallets", "++id").unwrap()).unwrap();
        let t = tables.table_mut("wallets").unwrap();
        t.put(record(json!({"name": "a"}))).unwrap();
        t.put(record(json!({"name": "b"}))).unwrap();
        t.remove(&Key::Int(2));
        tables.set_version(3);

        let mut restored = Tables::from_persisted(3, tables.to_persisted()).unwrap();
        assert_eq!(restored.version(), 3);
        let t = restored.table_mut("wallets").unwrap();
        assert_eq!(t.len(), 1);
        // Deleted ids are not reused.
        assert_eq!(t.put(Record::new()).unwrap(), Key::Int(3));
    }

    #[test]
    fn test_unknown_table() {
        let tables = Tables::new();
        assert!(matches!(tables.table("nope"), Err(StoreError::UnknownTable(_))));
    }
}
