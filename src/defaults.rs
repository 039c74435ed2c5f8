//! Default application configuration.
//!
//! Migrations compare legacy settings against these defaults and only
//! persist values that differ. The source is a trait so callers can
//! supply their own configuration tree.

use crate::path::get_by_path;
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// Failure to read a default value.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DefaultsError {
    #[error("default configuration unavailable at '{0}'")]
    Unavailable(String),
}

/// Read access to the default configuration by dotted path.
pub trait DefaultsSource: Send + Sync + fmt::Debug {
    /// The default at `path`, or `None` if nothing is configured there.
    fn default_at(&self, path: &str) -> Result<Option<Value>, DefaultsError>;
}

impl DefaultsSource for Value {
    fn default_at(&self, path: &str) -> Result<Option<Value>, DefaultsError> {
        Ok(get_by_path(self, path).cloned())
    }
}

/// Built-in configuration defaults of the desktop application.
pub fn builtin_defaults() -> Value {
    json!({
        "theme": "dark",
        "currency": "USD",
        "locale": "en",
        "chains": ["bitcoin", "litecoin", "groestlcoin"],
        "networks": ["testnet", "mainnet"],
        "chain": "groestlcoin",
        "network": "mainnet",
        "address": "p2wkh",
        "lnd": {
            "autopilot": {
                "active": false,
                "private": true,
                "maxchannels": 5,
                "minchansize": 20000,
                "maxchansize": 16777215,
                "allocation": 0.6,
                "minconfs": 1
            }
        },
        "units": {
            "bitcoin": "sats",
            "litecoin": "lits",
            "groestlcoin": "gros"
        },
        "blockExplorer": "chainz",
        "rateProvider": "coingecko",
        "invoices": {
            "expire": 3600,
            "baseRetryDelay": 1000,
            "retryCount": 2
        },
        "autopay": {
            "min": "1",
            "max": "1500000",
            "defaultValue": "150000"
        },
        "channels": {
            "viewMode": "card"
        }
    })
}
