//! Table shapes: which fields a record may hold and how tables are keyed.
//!
//! Field templates are static and closed; anything not listed is dropped
//! by the hook pipeline. Table definitions (primary key, indexes) are
//! declared per schema version by the migration chain.

mod registry;
mod table;

pub use registry::{FieldDef, FieldKind, SchemaRegistry, Template};
pub use table::{PrimaryKeyDef, TableDef};

/// Key-value application settings.
pub const SETTINGS: &str = "settings";

/// Wallet profiles.
pub const WALLETS: &str = "wallets";

/// Per-node metadata.
pub const NODES: &str = "nodes";

/// Scheduled-payment rules.
pub const AUTOPAY: &str = "autopay";
