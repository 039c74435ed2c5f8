//! Full-store snapshot file.
//!
//! Layout: magic, format version, schema version (u32 LE), payload length
//! (u64 LE), MessagePack payload, CRC32 of the payload (u32 LE). The
//! schema version sits in the fixed header so it can be read before
//! anything else is loaded.

use super::tables::{PersistedTables, Tables};
use crate::error::{Result, StoreError};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

/// Magic bytes for the snapshot file.
const SNAPSHOT_MAGIC: &[u8; 4] = b"WDB\0";

/// Current snapshot format version.
const SNAPSHOT_FORMAT: u8 = 1;

/// Payloads above this size are treated as corruption.
const MAX_PAYLOAD: u64 = 1024 * 1024 * 1024;

/// Read only the schema version from the header.
///
/// Returns `None` if no snapshot has been written yet.
pub fn read_version(path: &Path) -> Result<Option<u32>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut file = File::open(path)?;
    read_header(&mut file).map(Some)
}

fn read_header(file: &mut File) -> Result<u32> {
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;
    if &magic != SNAPSHOT_MAGIC {
        return Err(StoreError::InvalidFormat("Invalid snapshot magic".into()));
    }

    let mut format = [0u8; 1];
    file.read_exact(&mut format)?;
    if format[0] != SNAPSHOT_FORMAT {
        return Err(StoreError::InvalidFormat(format!(
            "Unsupported snapshot format: {}",
            format[0]
        )));
    }

    let mut version = [0u8; 4];
    file.read_exact(&mut version)?;
    Ok(u32::from_le_bytes(version))
}

/// Load the snapshot, or `None` if it does not exist.
pub fn read(path: &Path) -> Result<Option<Tables>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut file = File::open(path)?;
    let version = read_header(&mut file)?;

    let mut len_bytes = [0u8; 8];
    file.read_exact(&mut len_bytes)?;
    let len = u64::from_le_bytes(len_bytes);
    if len > MAX_PAYLOAD {
        return Err(StoreError::Corruption("Snapshot payload too large".into()));
    }

    let mut payload = vec![0u8; len as usize];
    file.read_exact(&mut payload)?;

    let mut checksum_bytes = [0u8; 4];
    file.read_exact(&mut checksum_bytes)?;
    let expected = u32::from_le_bytes(checksum_bytes);
    let got = crc32fast::hash(&payload);
    if expected != got {
        return Err(StoreError::ChecksumMismatch { expected, got });
    }

    let persisted: PersistedTables = rmp_serde::from_slice(&payload)?;
    Tables::from_persisted(version, persisted).map(Some)
}

/// Write the snapshot atomically: temp file, fsync, rename.
pub fn write(path: &Path, tables: &Tables) -> Result<()> {
    let payload = rmp_serde::to_vec(&tables.to_persisted())?;
    let tmp_path = path.with_extension("tmp");

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;

        file.write_all(SNAPSHOT_MAGIC)?;
        file.write_all(&[SNAPSHOT_FORMAT])?;
        file.write_all(&tables.version().to_le_bytes())?;
        file.write_all(&(payload.len() as u64).to_le_bytes())?;
        file.write_all(&payload)?;
        file.write_all(&crc32fast::hash(&payload).to_le_bytes())?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, path)?;
    if let Some(parent) = path.parent() {
        // Persist the rename itself where the platform allows it.
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableDef;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> Tables {
        let mut tables = Tables::new();
        tables.define(TableDef::parse("settings", "key").unwrap()).unwrap();
        tables
            .table_mut("settings")
            .unwrap()
            .put(
                json!({"key": "theme", "value": {"nested": [1, 2.5, "x", null, true]}})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .unwrap();
        tables.set_version(4);
        tables
    }

    #[test]
    fn test_write_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.bin");

        assert!(read(&path).unwrap().is_none());
        assert_eq!(read_version(&path).unwrap(), None);

        write(&path, &sample()).unwrap();
        assert_eq!(read_version(&path).unwrap(), Some(4));

        let tables = read(&path).unwrap().unwrap();
        assert_eq!(tables.version(), 4);
        let record = tables
            .table("settings")
            .unwrap()
            .get(&"theme".into())
            .unwrap();
        assert_eq!(record.get("value"), Some(&json!({"nested": [1, 2.5, "x", null, true]})));
    }

    #[test]
    fn test_detects_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.bin");
        write(&path, &sample()).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 6;
        bytes[last] ^= 0xff;
        fs::write(&path, &bytes).unwrap();

        assert!(matches!(read(&path), Err(StoreError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_bad_magic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.bin");
        fs::write(&path, b"nope-nope-nope").unwrap();
        assert!(matches!(read_version(&path), Err(StoreError::InvalidFormat(_))));
    }
}
