//! # walletdb
//!
//! An embedded, schema-versioned record store for a desktop Lightning
//! wallet: wallet profiles, node metadata, settings and autopay rules.
//!
//! ## Core Concepts
//!
//! - **Tables**: records are JSON objects keyed by an inbound primary key
//! - **Schema versions**: declared in order; pending versions run on open,
//!   each committed atomically
//! - **Hooks**: per-table creating/updating/reading hooks keep records
//!   closed to their field template
//! - **Virtual fields**: `host`, `cert` and `macaroon` are decoded from a
//!   wallet's connection string on read and never stored
//!
//! ## Example
//!
//! ```ignore
//! use walletdb::{Store, StoreConfig, Wallet};
//!
//! let store = Store::open_or_create(StoreConfig {
//!     path: "./wallet-db".into(),
//!     ..Default::default()
//! })?;
//!
//! let wallets = store.wallets()?;
//! let id = wallets.create(&Wallet::local("bitcoin", "testnet"))?;
//! let view = wallets.get(id)?;
//!
//! store.nodes()?.set_current_address("pubkey", "p2wkh", "tb1q...")?;
//! ```

pub mod codec;
pub mod collections;
pub mod defaults;
pub mod error;
pub mod hooks;
pub mod migrations;
pub mod models;
pub mod path;
pub mod registry;
pub mod schema;
pub mod storage;
pub mod store;
pub mod types;
pub mod virtual_fields;

// Re-exports
pub use codec::{CodecError, ConnectionCodec, ConnectionParams, LndConnectCodec, LND_CONNECTION_V1};
pub use collections::{AutopayRules, Nodes, Settings, Wallets};
pub use defaults::{builtin_defaults, DefaultsError, DefaultsSource};
pub use error::{Result, StoreError};
pub use hooks::HookPipeline;
pub use migrations::{
    standard_chain, MigrationChain, RecordAction, SchemaVersion, Transaction, UpgradeContext,
};
pub use models::{AutopayRule, AutopilotConfig, Node, Setting, Wallet, WalletType, WalletView};
pub use registry::{StoreName, StoreRegistry};
pub use schema::{FieldKind, SchemaRegistry, TableDef};
pub use store::{Store, StoreConfig, Table};
pub use types::*;
