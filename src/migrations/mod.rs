//! Versioned schema migrations.
//!
//! A store records the schema version its tables conform to. On open,
//! every declared version above it runs in increasing order. Each version
//! applies its table definitions and its upgrade function to a working
//! copy of the tables; the copy replaces the live tables and is persisted
//! only if the whole step succeeds. A failed step leaves the store at the
//! previous version, so it is retried verbatim on the next open.
//!
//! There is no downgrade path: a store newer than the running chain
//! refuses to open.

mod transaction;
mod upgrades;

pub use transaction::{ModifySummary, RecordAction, Transaction};
pub use upgrades::{
    settings_to_config, standard_chain, wallets_to_lndconnect, LegacySetting, CONFIG_KEY,
    LEGACY_SETTINGS,
};

use crate::codec::ConnectionCodec;
use crate::defaults::DefaultsSource;
use crate::error::{Result, StoreError};
use crate::schema::TableDef;
use crate::storage::Tables;
use std::fmt;

/// Collaborators available to upgrade functions.
#[derive(Clone, Copy, Debug)]
pub struct UpgradeContext<'a> {
    pub defaults: &'a dyn DefaultsSource,
    pub codec: &'a dyn ConnectionCodec,
}

/// Record-level transform for one version.
pub type UpgradeFn = fn(&mut Transaction<'_>, &UpgradeContext<'_>) -> Result<()>;

/// One declared schema version.
#[derive(Clone)]
pub struct SchemaVersion {
    version: u32,
    /// Table definitions; `None` drops the table.
    stores: Vec<(String, Option<String>)>,
    upgrade: Option<UpgradeFn>,
}

impl SchemaVersion {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            stores: Vec::new(),
            upgrade: None,
        }
    }

    /// Create or redefine `table` (see [`TableDef::parse`]).
    pub fn store(mut self, table: impl Into<String>, definition: impl Into<String>) -> Self {
        self.stores.push((table.into(), Some(definition.into())));
        self
    }

    /// Drop `table` and all of its records.
    pub fn drop_store(mut self, table: impl Into<String>) -> Self {
        self.stores.push((table.into(), None));
        self
    }

    pub fn upgrade(mut self, upgrade: UpgradeFn) -> Self {
        self.upgrade = Some(upgrade);
        self
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    fn apply_stores(&self, tx: &mut Transaction<'_>) -> Result<()> {
        for (table, definition) in &self.stores {
            match definition {
                Some(definition) => tx.define(TableDef::parse(table, definition)?)?,
                None => {
                    tx.drop_table(table);
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaVersion")
            .field("version", &self.version)
            .field("stores", &self.stores)
            .field("upgrade", &self.upgrade.is_some())
            .finish()
    }
}

/// Ordered list of schema versions.
#[derive(Clone, Debug, Default)]
pub struct MigrationChain {
    versions: Vec<SchemaVersion>,
}

impl MigrationChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a version. Versions must be declared in increasing order.
    pub fn push(&mut self, version: SchemaVersion) -> Result<()> {
        if version.version == 0 {
            return Err(StoreError::InvalidSchema(
                "schema versions start at 1".into(),
            ));
        }
        if let Some(last) = self.versions.last() {
            if version.version <= last.version {
                return Err(StoreError::InvalidSchema(format!(
                    "version {} declared after version {}",
                    version.version, last.version
                )));
            }
        }
        self.versions.push(version);
        Ok(())
    }

    pub fn from_versions(versions: impl IntoIterator<Item = SchemaVersion>) -> Result<Self> {
        let mut chain = Self::new();
        for version in versions {
            chain.push(version)?;
        }
        Ok(chain)
    }

    /// Highest declared version, or 0 for an empty chain.
    pub fn latest(&self) -> u32 {
        self.versions.last().map_or(0, |v| v.version)
    }

    pub fn versions(&self) -> &[SchemaVersion] {
        &self.versions
    }

    /// The chain as an older release would have declared it.
    pub fn up_to(&self, version: u32) -> Self {
        Self {
            versions: self
                .versions
                .iter()
                .filter(|v| v.version <= version)
                .cloned()
                .collect(),
        }
    }

    /// Tables of a brand-new store: every definition applied, no transforms.
    pub fn initial_tables(&self) -> Result<Tables> {
        let mut tables = Tables::new();
        {
            let mut tx = Transaction::new(&mut tables, self.latest());
            for version in &self.versions {
                version.apply_stores(&mut tx)?;
            }
        }
        tables.set_version(self.latest());
        Ok(tables)
    }

    /// Bring `tables` up to the latest version.
    ///
    /// `commit` persists each completed step; if it fails the step is
    /// treated as failed.
    pub fn migrate<C>(&self, tables: Tables, ctx: &UpgradeContext<'_>, mut commit: C) -> Result<Tables>
    where
        C: FnMut(&Tables) -> Result<()>,
    {
        let persisted = tables.version();
        let latest = self.latest();

        if persisted > latest {
            return Err(StoreError::Downgrade {
                persisted,
                known: latest,
            });
        }
        if persisted == latest {
            return Ok(tables);
        }

        if persisted == 0 {
            let fresh = self.initial_tables()?;
            commit(&fresh).map_err(|e| transition_error(latest, e))?;
            tracing::info!(version = latest, "created store schema");
            return Ok(fresh);
        }

        let mut current = tables;
        for step in self.versions.iter().filter(|v| v.version > persisted) {
            let mut working = current.clone();
            {
                let mut tx = Transaction::new(&mut working, step.version);
                step.apply_stores(&mut tx)
                    .map_err(|e| transition_error(step.version, e))?;
                if let Some(upgrade) = step.upgrade {
                    upgrade(&mut tx, ctx).map_err(|e| transition_error(step.version, e))?;
                }
            }
            working.set_version(step.version);
            commit(&working).map_err(|e| transition_error(step.version, e))?;

            tracing::info!(
                from = current.version(),
                to = step.version,
                records = working.record_count(),
                "schema upgrade committed"
            );
            current = working;
        }
        Ok(current)
    }
}

fn transition_error(version: u32, e: StoreError) -> StoreError {
    match e {
        StoreError::Transition { .. } | StoreError::Downgrade { .. } => e,
        other => StoreError::Transition {
            version,
            reason: other.to_string(),
        },
    }
}
