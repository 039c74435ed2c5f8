//! Main Store struct tying all components together.

use crate::codec::{ConnectionCodec, LndConnectCodec};
use crate::collections::{AutopayRules, Nodes, Settings, Wallets};
use crate::defaults::{builtin_defaults, DefaultsSource};
use crate::error::{Result, StoreError};
use crate::hooks::HookPipeline;
use crate::migrations::{standard_chain, MigrationChain, UpgradeContext};
use crate::schema::SchemaRegistry;
use crate::storage::{
    self, snapshot, Journal, JournalOp, Tables, JOURNAL_FILE, LOCK_FILE, MANIFEST_FILE,
    SNAPSHOT_FILE,
};
use crate::types::{Key, Modifications, Record, StoreStats};
use fs2::FileExt;
use parking_lot::{RwLock, RwLockWriteGuard};
use serde_json::Value;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Directory of the store.
    pub path: PathBuf,

    /// Whether to create the store if it doesn't exist.
    pub create_if_missing: bool,

    /// Journal entries written before an automatic checkpoint. 0 disables.
    pub checkpoint_interval: u64,

    /// Declared schema versions.
    pub migrations: MigrationChain,

    /// Field templates per table.
    pub registry: Arc<SchemaRegistry>,

    /// Default configuration consulted by upgrades.
    pub defaults: Arc<dyn DefaultsSource>,

    /// Connection string codec for wallets.
    pub codec: Arc<dyn ConnectionCodec>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./walletdb"),
            create_if_missing: true,
            checkpoint_interval: 256,
            migrations: standard_chain(),
            registry: Arc::new(SchemaRegistry::standard()),
            defaults: Arc::new(builtin_defaults()),
            codec: Arc::new(LndConnectCodec),
        }
    }
}

/// Magic bytes for store manifest.
const STORE_MAGIC: &[u8; 4] = b"WDB\0";

/// Current store directory format version.
const STORE_VERSION: u8 = 1;

/// An open wallet store.
///
/// Tables live in memory behind a lock. Every mutation is journaled and
/// fsynced before it is applied; checkpoints fold the journal into the
/// snapshot.
pub struct Store {
    config: StoreConfig,

    /// Lock file for exclusive access.
    _lock_file: File,

    tables: RwLock<Tables>,

    journal: Journal,

    hooks: RwLock<HookPipeline>,
}

impl Store {
    /// Open an existing store or create a new one.
    pub fn open_or_create(config: StoreConfig) -> Result<Self> {
        if config.path.join(MANIFEST_FILE).exists() {
            Self::open(config)
        } else if config.create_if_missing {
            Self::create(config)
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    /// Create a new store.
    pub fn create(config: StoreConfig) -> Result<Self> {
        fs::create_dir_all(&config.path)?;
        Self::write_manifest(&config.path)?;
        Self::load(config)
    }

    /// Open an existing store.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Self::verify_manifest(&config.path)?;
        Self::load(config)
    }

    /// Schema version recorded on disk, without opening the store.
    ///
    /// `None` if the store has never committed a version.
    pub fn persisted_version(path: impl AsRef<Path>) -> Result<Option<u32>> {
        snapshot::read_version(&path.as_ref().join(SNAPSHOT_FILE))
    }

    fn load(config: StoreConfig) -> Result<Self> {
        let lock_file = Self::acquire_lock(&config.path)?;
        let snapshot_path = config.path.join(SNAPSHOT_FILE);

        // Refuse newer stores before touching anything.
        let known = config.migrations.latest();
        if let Some(persisted) = snapshot::read_version(&snapshot_path)? {
            if persisted > known {
                return Err(StoreError::Downgrade { persisted, known });
            }
        }

        let mut tables = snapshot::read(&snapshot_path)?.unwrap_or_default();
        let (journal, entries) = Journal::open(config.path.join(JOURNAL_FILE))?;

        if !entries.is_empty() {
            for entry in &entries {
                storage::apply(&mut tables, &entry.op)?;
            }
            // Fold the replayed entries in so upgrades start from a clean journal.
            snapshot::write(&snapshot_path, &tables)?;
            journal.truncate()?;
            info!(entries = entries.len(), "replayed journal");
        }

        let ctx = UpgradeContext {
            defaults: config.defaults.as_ref(),
            codec: config.codec.as_ref(),
        };
        let tables = config
            .migrations
            .migrate(tables, &ctx, |t| snapshot::write(&snapshot_path, t))?;

        let hooks = HookPipeline::standard(Arc::clone(&config.registry), Arc::clone(&config.codec));

        info!(
            path = %config.path.display(),
            version = tables.version(),
            records = tables.record_count(),
            "opened store"
        );

        Ok(Self {
            config,
            _lock_file: lock_file,
            tables: RwLock::new(tables),
            journal,
            hooks: RwLock::new(hooks),
        })
    }

    // --- Tables ---

    /// Handle to a table.
    pub fn table(&self, name: &str) -> Result<Table<'_>> {
        if !self.tables.read().has_table(name) {
            return Err(StoreError::UnknownTable(name.to_string()));
        }
        Ok(Table {
            store: self,
            name: name.to_string(),
        })
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.read().table_names()
    }

    pub fn wallets(&self) -> Result<Wallets<'_>> {
        Wallets::new(self)
    }

    pub fn nodes(&self) -> Result<Nodes<'_>> {
        Nodes::new(self)
    }

    pub fn settings(&self) -> Result<Settings<'_>> {
        Settings::new(self)
    }

    pub fn autopay(&self) -> Result<AutopayRules<'_>> {
        AutopayRules::new(self)
    }

    /// Hook pipeline, for registering additional hooks.
    ///
    /// Table operations block while the guard is held.
    pub fn hooks(&self) -> RwLockWriteGuard<'_, HookPipeline> {
        self.hooks.write()
    }

    pub fn codec(&self) -> &dyn ConnectionCodec {
        self.config.codec.as_ref()
    }

    // --- Store Operations ---

    /// Current schema version.
    pub fn version(&self) -> u32 {
        self.tables.read().version()
    }

    /// Get store statistics.
    pub fn stats(&self) -> StoreStats {
        let tables = self.tables.read();
        StoreStats {
            schema_version: tables.version(),
            table_count: tables.table_names().len(),
            record_count: tables.record_count(),
            journal_entries: self.journal.len(),
        }
    }

    /// Write a snapshot and truncate the journal.
    pub fn checkpoint(&self) -> Result<()> {
        let tables = self.tables.read();
        self.checkpoint_locked(&tables)
    }

    /// Sync all data to disk.
    pub fn sync(&self) -> Result<()> {
        if self.journal.is_empty() {
            return Ok(());
        }
        self.checkpoint()
    }

    /// Checkpoint and release the store.
    pub fn close(self) -> Result<()> {
        self.sync()?;
        info!(path = %self.config.path.display(), "closed store");
        Ok(())
    }

    /// Get the store path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // --- Private Helpers ---

    fn checkpoint_locked(&self, tables: &Tables) -> Result<()> {
        snapshot::write(&self.config.path.join(SNAPSHOT_FILE), tables)?;
        let folded = self.journal.len();
        self.journal.truncate()?;
        debug!(entries = folded, "checkpoint written");
        Ok(())
    }

    /// Journal `op`, then apply it. Runs with the write guard held.
    fn commit(&self, tables: &mut Tables, op: JournalOp) -> Result<()> {
        self.journal.append(op.clone())?;
        storage::apply(tables, &op)?;

        let interval = self.config.checkpoint_interval;
        if interval > 0 && self.journal.len() >= interval {
            self.checkpoint_locked(tables)?;
        }
        Ok(())
    }

    fn write_manifest(path: &Path) -> Result<()> {
        use std::io::Write;

        let mut file = File::create(path.join(MANIFEST_FILE))?;
        file.write_all(STORE_MAGIC)?;
        file.write_all(&[STORE_VERSION])?;
        file.sync_all()?;

        Ok(())
    }

    fn verify_manifest(path: &Path) -> Result<()> {
        use std::io::Read;

        let mut file = File::open(path.join(MANIFEST_FILE))?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != STORE_MAGIC {
            return Err(StoreError::InvalidFormat("Invalid store magic".into()));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != STORE_VERSION {
            return Err(StoreError::InvalidFormat(format!(
                "Unsupported store version: {}",
                version[0]
            )));
        }

        Ok(())
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_file = File::create(path.join(LOCK_FILE))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| StoreError::Locked)?;

        Ok(lock_file)
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        // Best-effort sync on drop
        if let Err(e) = self.sync() {
            warn!(error = %e, "checkpoint on drop failed");
        }
    }
}

/// Handle to one table of an open store.
///
/// Writes pass through the table's creating or updating hooks and the
/// field kind check; reads pass through its reading hooks.
pub struct Table<'a> {
    store: &'a Store,
    name: String,
}

impl<'a> Table<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a new record. Fails with `RecordExists` if the key is taken.
    pub fn create(&self, record: Record) -> Result<Key> {
        self.write(record, false)
    }

    /// Insert or replace a record.
    pub fn put(&self, record: Record) -> Result<Key> {
        self.write(record, true)
    }

    /// Insert or replace the record at `key` with one built from its
    /// stored form, all under the write lock. `build` must not use the
    /// store.
    ///
    /// The result goes through the creating hooks like [`Table::put`] and
    /// must keep `key`.
    pub fn upsert<F>(&self, key: impl Into<Key>, build: F) -> Result<()>
    where
        F: FnOnce(Option<Record>) -> Result<Record>,
    {
        let key = key.into();
        let mut tables = self.store.tables.write();
        let data = tables.table(&self.name)?;

        let mut record = build(data.get(&key).cloned())?;
        self.store.hooks.read().run_creating(&self.name, &mut record);
        self.store.config.registry.check_kinds(&self.name, &record)?;
        if data.assign_key(&mut record)? != key {
            return Err(StoreError::PrimaryKeyChange {
                table: self.name.clone(),
                key,
            });
        }

        self.store.commit(
            &mut tables,
            JournalOp::Put {
                table: self.name.clone(),
                record,
            },
        )
    }

    fn write(&self, mut record: Record, replace: bool) -> Result<Key> {
        self.store.hooks.read().run_creating(&self.name, &mut record);
        self.store.config.registry.check_kinds(&self.name, &record)?;

        let mut tables = self.store.tables.write();
        let key = tables.table(&self.name)?.assign_key(&mut record)?;
        if !replace && tables.table(&self.name)?.contains(&key) {
            return Err(StoreError::RecordExists {
                table: self.name.clone(),
                key,
            });
        }

        self.store.commit(
            &mut tables,
            JournalOp::Put {
                table: self.name.clone(),
                record,
            },
        )?;
        Ok(key)
    }

    pub fn get(&self, key: impl Into<Key>) -> Result<Option<Record>> {
        let key = key.into();
        let record = self.store.tables.read().table(&self.name)?.get(&key).cloned();
        Ok(record.map(|r| self.read_view(r)))
    }

    /// The record as stored, without reading hooks.
    pub fn get_raw(&self, key: impl Into<Key>) -> Result<Option<Record>> {
        let key = key.into();
        Ok(self.store.tables.read().table(&self.name)?.get(&key).cloned())
    }

    /// Apply `modifications` to an existing record.
    pub fn update(&self, key: impl Into<Key>, modifications: Modifications) -> Result<()> {
        let key = key.into();
        let mut tables = self.store.tables.write();
        let data = tables.table(&self.name)?;

        let existing = data.get(&key).cloned().ok_or_else(|| StoreError::RecordNotFound {
            table: self.name.clone(),
            key: key.clone(),
        })?;

        let pk_field = data.def().primary_key.field.clone();
        let changes_key = match modifications.get(&pk_field) {
            Some(Some(value)) => Key::from_value(value).as_ref() != Some(&key),
            Some(None) => true,
            None => false,
        };
        if changes_key {
            return Err(StoreError::PrimaryKeyChange {
                table: self.name.clone(),
                key,
            });
        }

        let modifications = self
            .store
            .hooks
            .read()
            .run_updating(&self.name, &existing, modifications);

        let mut updated = existing;
        modifications.apply_to(&mut updated);
        if data.def().key_of(&updated).as_ref() != Some(&key) {
            return Err(StoreError::PrimaryKeyChange {
                table: self.name.clone(),
                key,
            });
        }
        self.store.config.registry.check_kinds(&self.name, &updated)?;

        self.store.commit(
            &mut tables,
            JournalOp::Put {
                table: self.name.clone(),
                record: updated,
            },
        )
    }

    /// Delete a record. Returns whether it existed.
    pub fn delete(&self, key: impl Into<Key>) -> Result<bool> {
        let key = key.into();
        let mut tables = self.store.tables.write();
        if !tables.table(&self.name)?.contains(&key) {
            return Ok(false);
        }
        self.store.commit(
            &mut tables,
            JournalOp::Delete {
                table: self.name.clone(),
                key,
            },
        )?;
        Ok(true)
    }

    /// Every record, in key order.
    pub fn all(&self) -> Result<Vec<Record>> {
        self.query(|_| true)
    }

    /// Records whose read view matches `predicate`, in key order.
    pub fn query(&self, predicate: impl Fn(&Record) -> bool) -> Result<Vec<Record>> {
        let records: Vec<Record> = self
            .store
            .tables
            .read()
            .table(&self.name)?
            .iter()
            .map(|(_, r)| r.clone())
            .collect();

        let hooks = self.store.hooks.read();
        Ok(records
            .into_iter()
            .map(|r| hooks.run_reading(&self.name, r))
            .filter(|r| predicate(r))
            .collect())
    }

    /// Records whose `index` field equals `value`.
    ///
    /// `index` must be the primary key or a declared index.
    pub fn where_equals(&self, index: &str, value: impl Into<Value>) -> Result<Vec<Record>> {
        let value = value.into();
        let records: Vec<Record> = {
            let tables = self.store.tables.read();
            let data = tables.table(&self.name)?;
            if !data.def().is_indexed(index) {
                return Err(StoreError::UnknownIndex {
                    table: self.name.clone(),
                    index: index.to_string(),
                });
            }
            data.iter()
                .filter(|(_, r)| r.get(index) == Some(&value))
                .map(|(_, r)| r.clone())
                .collect()
        };

        Ok(records.into_iter().map(|r| self.read_view(r)).collect())
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.store.tables.read().table(&self.name)?.len())
    }

    /// Remove every record.
    pub fn clear(&self) -> Result<()> {
        let mut tables = self.store.tables.write();
        if tables.table(&self.name)?.is_empty() {
            return Ok(());
        }
        self.store.commit(
            &mut tables,
            JournalOp::Clear {
                table: self.name.clone(),
            },
        )
    }

    fn read_view(&self, record: Record) -> Record {
        self.store.hooks.read().run_reading(&self.name, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NODES, SETTINGS, WALLETS};
    use serde_json::json;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> StoreConfig {
        StoreConfig {
            path: dir.path().join("store"),
            ..Default::default()
        }
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_create_store() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();

        assert!(store.path().join(MANIFEST_FILE).exists());
        assert!(store.path().join(SNAPSHOT_FILE).exists());
        assert_eq!(store.version(), 4);
        assert_eq!(
            store.table_names(),
            vec!["autopay", "nodes", "settings", "wallets"]
        );
    }

    #[test]
    fn test_fresh_store_has_no_config_record() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();
        assert_eq!(store.table(SETTINGS).unwrap().count().unwrap(), 0);
    }

    #[test]
    fn test_open_missing_without_create() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig {
            create_if_missing: false,
            ..test_config(&dir)
        };
        assert!(matches!(
            Store::open_or_create(config),
            Err(StoreError::NotInitialized)
        ));
    }

    #[test]
    fn test_create_assigns_ids_and_rejects_duplicates() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();
        let wallets = store.table(WALLETS).unwrap();

        let a = wallets.create(record(json!({"type": "local"}))).unwrap();
        let b = wallets.create(record(json!({"type": "local"}))).unwrap();
        assert_eq!(a, Key::Int(1));
        assert_eq!(b, Key::Int(2));

        let err = wallets
            .create(record(json!({"id": 1, "type": "local"})))
            .unwrap_err();
        assert!(matches!(err, StoreError::RecordExists { .. }));
    }

    #[test]
    fn test_unknown_fields_dropped_on_create() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();
        let nodes = store.table(NODES).unwrap();

        nodes
            .put(record(json!({"id": "n1", "hasSynced": true, "color": "red"})))
            .unwrap();
        let node = nodes.get("n1").unwrap().unwrap();
        assert_eq!(node.get("color"), None);
        assert_eq!(node["hasSynced"], json!(true));
    }

    #[test]
    fn test_kind_check() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();
        let err = store
            .table(NODES)
            .unwrap()
            .put(record(json!({"id": "n1", "hasSynced": "yes"})))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedFieldKind { .. }));
    }

    #[test]
    fn test_update() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();
        let nodes = store.table(NODES).unwrap();
        nodes.put(record(json!({"id": "n1"}))).unwrap();

        nodes
            .update("n1", Modifications::new().set("hasSynced", true).set("junk", 1))
            .unwrap();
        let node = nodes.get("n1").unwrap().unwrap();
        assert_eq!(node, record(json!({"id": "n1", "hasSynced": true})));

        let missing = nodes.update("n2", Modifications::new().set("hasSynced", true));
        assert!(matches!(missing, Err(StoreError::RecordNotFound { .. })));

        let rekey = nodes.update("n1", Modifications::new().set("id", "n9"));
        assert!(matches!(rekey, Err(StoreError::PrimaryKeyChange { .. })));
    }

    #[test]
    fn test_out_of_range_id_is_not_journaled() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(StoreConfig {
            checkpoint_interval: 0,
            ..test_config(&dir)
        })
        .unwrap();
        let wallets = store.table(WALLETS).unwrap();

        let err = wallets
            .put(record(json!({"id": i64::MAX, "type": "local"})))
            .unwrap_err();
        assert!(matches!(err, StoreError::KeyOutOfRange { .. }));
        assert_eq!(store.stats().journal_entries, 0);
        assert_eq!(wallets.count().unwrap(), 0);

        // Auto-increment carries on normally.
        let key = wallets.create(record(json!({"type": "local"}))).unwrap();
        assert_eq!(key, Key::Int(1));
    }

    #[test]
    fn test_upsert() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();
        let nodes = store.table(NODES).unwrap();

        nodes
            .upsert("n1", |existing| {
                assert!(existing.is_none());
                Ok(record(json!({"id": "n1", "junk": 1})))
            })
            .unwrap();
        nodes
            .upsert("n1", |existing| {
                let mut node = existing.unwrap();
                node.insert("hasSynced".into(), json!(true));
                Ok(node)
            })
            .unwrap();
        assert_eq!(
            nodes.get_raw("n1").unwrap().unwrap(),
            record(json!({"id": "n1", "hasSynced": true}))
        );

        let rekey = nodes.upsert("n1", |_| Ok(record(json!({"id": "n2"}))));
        assert!(matches!(rekey, Err(StoreError::PrimaryKeyChange { .. })));
        assert_eq!(nodes.count().unwrap(), 1);
    }

    #[test]
    fn test_where_equals() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();
        let wallets = store.table(WALLETS).unwrap();
        wallets
            .create(record(json!({"type": "local", "chain": "bitcoin"})))
            .unwrap();
        wallets
            .create(record(json!({"type": "local", "chain": "litecoin"})))
            .unwrap();

        let found = wallets.where_equals("chain", "litecoin").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["wallet"], json!("wallet-2"));

        assert!(matches!(
            wallets.where_equals("name", "x"),
            Err(StoreError::UnknownIndex { .. })
        ));
    }

    #[test]
    fn test_delete_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();
        let nodes = store.table(NODES).unwrap();
        nodes.put(record(json!({"id": "a"}))).unwrap();
        nodes.put(record(json!({"id": "b"}))).unwrap();

        assert!(nodes.delete("a").unwrap());
        assert!(!nodes.delete("a").unwrap());
        assert_eq!(nodes.count().unwrap(), 1);

        nodes.clear().unwrap();
        assert_eq!(nodes.count().unwrap(), 0);
    }

    #[test]
    fn test_unknown_table() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();
        assert!(matches!(
            store.table("channels"),
            Err(StoreError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_persistence() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);

        {
            let store = Store::create(config.clone()).unwrap();
            store
                .table(SETTINGS)
                .unwrap()
                .put(record(json!({"key": "theme", "value": "light"})))
                .unwrap();
            store.close().unwrap();
        }

        {
            let store = Store::open(config).unwrap();
            let setting = store.table(SETTINGS).unwrap().get("theme").unwrap().unwrap();
            assert_eq!(setting["value"], json!("light"));
            assert_eq!(store.stats().journal_entries, 0);
        }
    }

    #[test]
    fn test_auto_checkpoint() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(StoreConfig {
            checkpoint_interval: 3,
            ..test_config(&dir)
        })
        .unwrap();
        let nodes = store.table(NODES).unwrap();

        nodes.put(record(json!({"id": "a"}))).unwrap();
        nodes.put(record(json!({"id": "b"}))).unwrap();
        assert_eq!(store.stats().journal_entries, 2);
        nodes.put(record(json!({"id": "c"}))).unwrap();
        assert_eq!(store.stats().journal_entries, 0);
    }

    #[test]
    fn test_store_lock() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);

        let _store1 = Store::create(config.clone()).unwrap();

        // Second store should fail to acquire lock
        let result = Store::open(config);
        assert!(matches!(result, Err(StoreError::Locked)));
    }

    #[test]
    fn test_custom_hooks() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();
        store.hooks().on_reading(NODES, |mut record| {
            record.insert("seen".into(), json!(true));
            record
        });

        let nodes = store.table(NODES).unwrap();
        nodes.put(record(json!({"id": "a"}))).unwrap();
        assert_eq!(nodes.get("a").unwrap().unwrap()["seen"], json!(true));
    }

    #[test]
    fn test_stats() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();
        store
            .table(NODES)
            .unwrap()
            .put(record(json!({"id": "a"})))
            .unwrap();

        let stats = store.stats();
        assert_eq!(stats.schema_version, 4);
        assert_eq!(stats.table_count, 4);
        assert_eq!(stats.record_count, 1);
        assert_eq!(stats.journal_entries, 1);
    }
}
