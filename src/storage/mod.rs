//! Physical persistence: snapshot plus write-ahead journal.
//!
//! A store directory holds:
//! - `MANIFEST`: magic and directory format version
//! - `LOCK`: exclusive process lock
//! - `snapshot.bin`: all tables at the last checkpoint, with the schema version
//! - `journal.log`: mutations since that checkpoint

mod journal;
pub mod snapshot;
mod tables;

pub use journal::{Journal, JournalEntry, JournalOp};
pub use tables::{TableData, Tables};

use crate::error::Result;

pub const MANIFEST_FILE: &str = "MANIFEST";
pub const LOCK_FILE: &str = "LOCK";
pub const SNAPSHOT_FILE: &str = "snapshot.bin";
pub const JOURNAL_FILE: &str = "journal.log";

/// Apply a journaled operation to in-memory tables.
pub fn apply(tables: &mut Tables, op: &JournalOp) -> Result<()> {
    match op {
        JournalOp::Put { table, record } => {
            tables.table_mut(table)?.put(record.clone())?;
        }
        JournalOp::Delete { table, key } => {
            tables.table_mut(table)?.remove(key);
        }
        JournalOp::Clear { table } => {
            tables.table_mut(table)?.clear();
        }
    }
    Ok(())
}
