//! Write-ahead journal of record mutations.
//!
//! Every committed table write is appended here before it is applied in
//! memory. On open the journal is replayed on top of the last snapshot;
//! a checkpoint writes a fresh snapshot and truncates the journal.

use crate::error::{Result, StoreError};
use crate::types::{Key, Record};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Magic bytes for the journal file.
const JOURNAL_MAGIC: &[u8; 4] = b"JRN\0";

/// Current journal format version.
const JOURNAL_VERSION: u8 = 1;

/// Header size: magic + version.
const HEADER_LEN: u64 = 5;

/// A single mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JournalOp {
    /// Insert or replace a record.
    Put { table: String, record: Record },
    /// Remove a record.
    Delete { table: String, key: Key },
    /// Remove every record of a table.
    Clear { table: String },
}

/// A single journal entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JournalEntry {
    pub seq: u64,
    pub op: JournalOp,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

/// Append-only journal file.
pub struct Journal {
    path: PathBuf,
    next_seq: Mutex<u64>,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl Journal {
    /// Open or create the journal, returning the entries to replay.
    ///
    /// A damaged tail (torn write from a crash) ends replay; the file is
    /// truncated back to the last intact entry.
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, Vec<JournalEntry>)> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let file = File::open(&path)?;
            let file_len = file.metadata()?.len();
            let mut reader = BufReader::new(file);

            let mut magic = [0u8; 4];
            reader.read_exact(&mut magic)?;
            if &magic != JOURNAL_MAGIC {
                return Err(StoreError::InvalidFormat("Invalid journal magic".into()));
            }

            let mut version = [0u8; 1];
            reader.read_exact(&mut version)?;
            if version[0] != JOURNAL_VERSION {
                return Err(StoreError::InvalidFormat(format!(
                    "Unsupported journal version: {}",
                    version[0]
                )));
            }

            let mut entries = Vec::new();
            let mut good_len = HEADER_LEN;
            while good_len < file_len {
                match Self::read_entry(&mut reader) {
                    Ok((entry, size)) => {
                        good_len += size;
                        entries.push(entry);
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            offset = good_len,
                            error = %e,
                            "discarding damaged journal tail"
                        );
                        break;
                    }
                }
            }

            if good_len < file_len {
                let file = OpenOptions::new().write(true).open(&path)?;
                file.set_len(good_len)?;
                file.sync_all()?;
            }
            entries
        } else {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&path)?;
            file.write_all(JOURNAL_MAGIC)?;
            file.write_all(&[JOURNAL_VERSION])?;
            file.sync_all()?;
            Vec::new()
        };

        let next_seq = entries.last().map_or(1, |e| e.seq + 1);
        let writer = BufWriter::new(OpenOptions::new().append(true).open(&path)?);

        Ok((
            Self {
                path,
                next_seq: Mutex::new(next_seq),
                writer: Mutex::new(Some(writer)),
            },
            entries,
        ))
    }

    /// Append and fsync an operation. Returns its sequence number.
    pub fn append(&self, op: JournalOp) -> Result<u64> {
        let mut next_seq = self.next_seq.lock();
        let seq = *next_seq;

        let entry = JournalEntry {
            seq,
            op,
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        };

        let mut writer = self.writer.lock();
        let w = writer
            .as_mut()
            .ok_or_else(|| StoreError::InvalidFormat("journal is closed".into()))?;
        Self::write_entry(w, &entry)?;
        w.flush()?;
        w.get_ref().sync_all()?;

        *next_seq += 1;
        Ok(seq)
    }

    /// Number of entries written since the last truncation.
    pub fn len(&self) -> u64 {
        *self.next_seq.lock() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry (called after a successful checkpoint).
    pub fn truncate(&self) -> Result<()> {
        let mut next_seq = self.next_seq.lock();
        let mut writer = self.writer.lock();
        *writer = None;

        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(JOURNAL_MAGIC)?;
        file.write_all(&[JOURNAL_VERSION])?;
        file.sync_all()?;

        *writer = Some(BufWriter::new(
            OpenOptions::new().append(true).open(&self.path)?,
        ));
        *next_seq = 1;
        Ok(())
    }

    fn write_entry(writer: &mut BufWriter<File>, entry: &JournalEntry) -> Result<()> {
        let encoded = rmp_serde::to_vec(entry)?;

        writer.write_all(&(encoded.len() as u32).to_le_bytes())?;
        writer.write_all(&encoded)?;
        writer.write_all(&crc32fast::hash(&encoded).to_le_bytes())?;
        Ok(())
    }

    /// Read one entry, returning it with its on-disk size.
    fn read_entry(reader: &mut impl Read) -> Result<(JournalEntry, u64)> {
        let mut len_bytes = [0u8; 4];
        reader.read_exact(&mut len_bytes)?;
        let len = u32::from_le_bytes(len_bytes) as usize;

        if len > 64 * 1024 * 1024 {
            return Err(StoreError::Corruption("Journal entry too large".into()));
        }

        let mut encoded = vec![0u8; len];
        reader.read_exact(&mut encoded)?;

        let mut checksum_bytes = [0u8; 4];
        reader.read_exact(&mut checksum_bytes)?;
        let expected = u32::from_le_bytes(checksum_bytes);
        let got = crc32fast::hash(&encoded);
        if expected != got {
            return Err(StoreError::ChecksumMismatch { expected, got });
        }

        let entry = rmp_serde::from_slice(&encoded)?;
        Ok((entry, 4 + len as u64 + 4))
    }
}
