//! Transaction-scoped view of the tables during one schema upgrade.

use crate::error::Result;
use crate::schema::TableDef;
use crate::storage::{TableData, Tables};
use crate::types::{Key, Record};

/// What to do with a record after a `modify` callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordAction {
    Keep,
    Delete,
}

/// Counts from a `modify` pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModifySummary {
    pub kept: usize,
    pub deleted: usize,
}

/// Working copy of the tables for one version step.
///
/// Nothing written here is visible outside the step until the whole step
/// commits.
pub struct Transaction<'a> {
    tables: &'a mut Tables,
    version: u32,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(tables: &'a mut Tables, version: u32) -> Self {
        Self { tables, version }
    }

    /// The version this transaction upgrades to.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn table(&self, name: &str) -> Result<&TableData> {
        self.tables.table(name)
    }

    pub fn define(&mut self, def: TableDef) -> Result<()> {
        self.tables.define(def)
    }

    pub fn drop_table(&mut self, name: &str) -> bool {
        self.tables.drop_table(name)
    }

    /// Visit every record of `table` in key order.
    ///
    /// The callback edits the record in place and decides whether it stays.
    /// One record's outcome never affects the others.
    pub fn modify<F>(&mut self, table: &str, mut f: F) -> Result<ModifySummary>
    where
        F: FnMut(&mut Record) -> RecordAction,
    {
        let data = self.tables.table_mut(table)?;
        let mut summary = ModifySummary::default();

        for key in data.keys() {
            let action = match data.get_mut(&key) {
                Some(record) => f(record),
                None => continue,
            };
            match action {
                RecordAction::Keep => summary.kept += 1,
                RecordAction::Delete => {
                    data.remove(&key);
                    summary.deleted += 1;
                }
            }
        }
        Ok(summary)
    }

    pub fn put(&mut self, table: &str, record: Record) -> Result<Key> {
        self.tables.table_mut(table)?.put(record)
    }

    pub fn delete(&mut self, table: &str, key: &Key) -> Result<bool> {
        Ok(self.tables.table_mut(table)?.remove(key).is_some())
    }
}
