//! Named stores under a common root directory.

use crate::error::{Result, StoreError};
use crate::store::{Store, StoreConfig};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Store name composed from application namespace, optional domain and
/// environment: `namespace[.domain].environment`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoreName {
    pub namespace: String,
    pub domain: Option<String>,
    pub environment: String,
}

impl StoreName {
    pub fn new(namespace: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            domain: None,
            environment: environment.into(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.domain {
            Some(domain) => write!(f, "{}.{}.{}", self.namespace, domain, self.environment),
            None => write!(f, "{}.{}", self.namespace, self.environment),
        }
    }
}

/// Opens each named store at most once per process.
///
/// Every store lives in `<root>/<name>` and is opened with a copy of the
/// base configuration.
pub struct StoreRegistry {
    base: StoreConfig,
    open: Mutex<HashMap<String, Arc<Store>>>,
}

impl StoreRegistry {
    /// `base.path` is the root directory for all stores.
    pub fn new(base: StoreConfig) -> Self {
        Self {
            base,
            open: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.base.path
    }

    /// The open store called `name`, opening or creating it on first use.
    pub fn open(&self, name: &str) -> Result<Arc<Store>> {
        validate_name(name)?;

        let mut open = self.open.lock();
        if let Some(store) = open.get(name) {
            return Ok(Arc::clone(store));
        }

        let config = StoreConfig {
            path: self.path_of(name),
            ..self.base.clone()
        };
        let store = Arc::new(Store::open_or_create(config)?);
        open.insert(name.to_string(), Arc::clone(&store));
        debug!(name, "registered store");
        Ok(store)
    }

    pub fn open_named(&self, name: &StoreName) -> Result<Arc<Store>> {
        self.open(&name.to_string())
    }

    pub fn get(&self, name: &str) -> Option<Arc<Store>> {
        self.open.lock().get(name).cloned()
    }

    pub fn is_open(&self, name: &str) -> bool {
        self.open.lock().contains_key(name)
    }

    /// Forget `name` and checkpoint it.
    ///
    /// The files are released once every outstanding handle is dropped.
    /// Returns false if the store was not open.
    pub fn close(&self, name: &str) -> Result<bool> {
        let store = match self.open.lock().remove(name) {
            Some(store) => store,
            None => return Ok(false),
        };
        match Arc::try_unwrap(store) {
            Ok(store) => store.close()?,
            Err(shared) => shared.sync()?,
        }
        Ok(true)
    }

    pub fn close_all(&self) -> Result<()> {
        let names: Vec<String> = self.open.lock().keys().cloned().collect();
        for name in names {
            self.close(&name)?;
        }
        Ok(())
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.base.path.join(name)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if invalid {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}
