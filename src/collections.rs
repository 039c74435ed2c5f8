//! Typed access to the wallet application's tables.

use crate::error::{Result, StoreError};
use crate::migrations::CONFIG_KEY;
use crate::models::{from_record, to_record, AutopayRule, Node, Setting, Wallet, WalletView};
use crate::path::{get_by_path, set_in_record};
use crate::schema::{AUTOPAY, NODES, SETTINGS, WALLETS};
use crate::store::{Store, Table};
use crate::types::{Key, Modifications, Record};
use serde_json::Value;

/// Wallet profiles, keyed by auto-increment id.
pub struct Wallets<'a> {
    table: Table<'a>,
}

impl<'a> Wallets<'a> {
    pub(crate) fn new(store: &'a Store) -> Result<Self> {
        Ok(Self {
            table: store.table(WALLETS)?,
        })
    }

    /// Store a new wallet and return its id.
    pub fn create(&self, wallet: &Wallet) -> Result<i64> {
        match self.table.create(to_record(wallet)?)? {
            Key::Int(id) => Ok(id),
            other => Err(StoreError::Corruption(format!(
                "wallet stored under non-integer key {}",
                other
            ))),
        }
    }

    pub fn get(&self, id: i64) -> Result<Option<WalletView>> {
        self.table.get(id)?.map(from_record).transpose()
    }

    pub fn update(&self, id: i64, modifications: Modifications) -> Result<()> {
        self.table.update(id, modifications)
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        self.table.delete(id)
    }

    /// Every wallet in id order.
    pub fn list(&self) -> Result<Vec<WalletView>> {
        self.table.all()?.into_iter().map(from_record).collect()
    }

    pub fn query(&self, predicate: impl Fn(&WalletView) -> bool) -> Result<Vec<WalletView>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|wallet| predicate(wallet))
            .collect())
    }

    /// Wallets on `chain`, through the chain index.
    pub fn on_chain(&self, chain: &str) -> Result<Vec<WalletView>> {
        self.table
            .where_equals("chain", chain)?
            .into_iter()
            .map(from_record)
            .collect()
    }

    pub fn table(&self) -> &Table<'a> {
        &self.table
    }
}

/// Per-node metadata, keyed by node id.
pub struct Nodes<'a> {
    table: Table<'a>,
}

impl<'a> Nodes<'a> {
    pub(crate) fn new(store: &'a Store) -> Result<Self> {
        Ok(Self {
            table: store.table(NODES)?,
        })
    }

    pub fn get(&self, id: &str) -> Result<Option<Node>> {
        self.table.get(id)?.map(from_record).transpose()
    }

    pub fn put(&self, node: &Node) -> Result<()> {
        self.table.put(to_record(node)?)?;
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        self.table.delete(id)
    }

    pub fn current_address(&self, id: &str, address_type: &str) -> Result<Option<String>> {
        Ok(self
            .get(id)?
            .and_then(|node| node.current_address(address_type).map(str::to_string)))
    }

    /// Record `address` as the current one for `address_type`, replacing
    /// any previous address of that type. Creates the node if needed.
    pub fn set_current_address(&self, id: &str, address_type: &str, address: &str) -> Result<()> {
        let path = format!("addresses.{}", address_type);
        self.table.upsert(id, |existing| {
            let mut record = existing.unwrap_or_else(|| {
                let mut record = Record::new();
                record.insert("id".into(), Value::from(id));
                record
            });
            set_in_record(&mut record, &path, Value::from(address))?;
            Ok(record)
        })
    }

    pub fn table(&self) -> &Table<'a> {
        &self.table
    }
}

/// Key-value settings.
pub struct Settings<'a> {
    table: Table<'a>,
}

impl<'a> Settings<'a> {
    pub(crate) fn new(store: &'a Store) -> Result<Self> {
        Ok(Self {
            table: store.table(SETTINGS)?,
        })
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self
            .table
            .get(key)?
            .map(|mut record| record.remove("value").unwrap_or(Value::Null)))
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.table.put(to_record(&Setting {
            key: key.to_string(),
            value: value.into(),
        })?)?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        self.table.delete(key)
    }

    pub fn all(&self) -> Result<Vec<Setting>> {
        self.table.all()?.into_iter().map(from_record).collect()
    }

    /// The nested configuration overrides, or an empty object.
    pub fn config_overrides(&self) -> Result<Value> {
        Ok(self
            .get(CONFIG_KEY)?
            .filter(Value::is_object)
            .unwrap_or_else(|| Value::Object(Record::new())))
    }

    /// One override by dotted path, e.g. `units.bitcoin`.
    pub fn config_override(&self, path: &str) -> Result<Option<Value>> {
        Ok(get_by_path(&self.config_overrides()?, path).cloned())
    }
}

/// Scheduled-payment rules, keyed by rule id.
pub struct AutopayRules<'a> {
    table: Table<'a>,
}

impl<'a> AutopayRules<'a> {
    pub(crate) fn new(store: &'a Store) -> Result<Self> {
        Ok(Self {
            table: store.table(AUTOPAY)?,
        })
    }

    pub fn get(&self, id: &str) -> Result<Option<AutopayRule>> {
        self.table.get(id)?.map(from_record).transpose()
    }

    pub fn put(&self, rule: &AutopayRule) -> Result<()> {
        self.table.put(to_record(rule)?)?;
        Ok(())
    }

    pub fn remove(&self, id: &str) -> Result<bool> {
        self.table.delete(id)
    }

    pub fn list(&self) -> Result<Vec<AutopayRule>> {
        self.table.all()?.into_iter().map(from_record).collect()
    }
}
