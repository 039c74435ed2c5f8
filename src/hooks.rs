//! Per-table hooks run around every create, update and read.
//!
//! The standard pipeline keeps tables closed: unknown fields are dropped
//! on create, and on update every field outside the template is removed,
//! including legacy fields the caller did not touch. Wallet reads get the
//! `wallet` label and the derived connection fields.

use crate::codec::ConnectionCodec;
use crate::schema::{SchemaRegistry, Template, AUTOPAY, NODES, SETTINGS, WALLETS};
use crate::types::{Modifications, Record};
use crate::virtual_fields::with_virtual_fields;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Runs on a new record before it is written.
pub type CreatingHook = Arc<dyn Fn(&mut Record) + Send + Sync>;

/// Maps `(existing record, modifications)` to the modifications to apply.
pub type UpdatingHook = Arc<dyn Fn(&Record, Modifications) -> Modifications + Send + Sync>;

/// Runs on a fetched record before it is returned.
pub type ReadingHook = Arc<dyn Fn(Record) -> Record + Send + Sync>;

#[derive(Clone, Default)]
struct TableHooks {
    creating: Vec<CreatingHook>,
    updating: Vec<UpdatingHook>,
    reading: Vec<ReadingHook>,
}

/// Ordered hooks for every table.
#[derive(Clone, Default)]
pub struct HookPipeline {
    tables: HashMap<String, TableHooks>,
}

impl HookPipeline {
    /// A pipeline with no hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitization hooks for every closed table, plus the wallet read hook.
    pub fn standard(registry: Arc<SchemaRegistry>, codec: Arc<dyn ConnectionCodec>) -> Self {
        let mut pipeline = Self::new();

        let mut closed: Vec<String> = Vec::new();
        for table in [SETTINGS, WALLETS, NODES, AUTOPAY] {
            if let Some(Template::Closed(_)) = registry.template(table) {
                closed.push(table.to_string());
            }
        }

        for table in closed {
            let create_registry = Arc::clone(&registry);
            let create_table = table.clone();
            pipeline.on_creating(&table, move |record| {
                create_registry.strip_unknown(&create_table, record);
            });

            let update_registry = Arc::clone(&registry);
            let update_table = table.clone();
            pipeline.on_updating(&table, move |existing, modifications| {
                sanitize_modifications(&update_registry, &update_table, existing, modifications)
            });
        }

        pipeline.on_reading(WALLETS, move |record| {
            label_wallet(with_virtual_fields(record, codec.as_ref()))
        });

        pipeline
    }

    pub fn on_creating(
        &mut self,
        table: &str,
        hook: impl Fn(&mut Record) + Send + Sync + 'static,
    ) {
        self.entry(table).creating.push(Arc::new(hook));
    }

    pub fn on_updating(
        &mut self,
        table: &str,
        hook: impl Fn(&Record, Modifications) -> Modifications + Send + Sync + 'static,
    ) {
        self.entry(table).updating.push(Arc::new(hook));
    }

    pub fn on_reading(
        &mut self,
        table: &str,
        hook: impl Fn(Record) -> Record + Send + Sync + 'static,
    ) {
        self.entry(table).reading.push(Arc::new(hook));
    }

    fn entry(&mut self, table: &str) -> &mut TableHooks {
        self.tables.entry(table.to_string()).or_default()
    }

    pub fn run_creating(&self, table: &str, record: &mut Record) {
        if let Some(hooks) = self.tables.get(table) {
            for hook in &hooks.creating {
                hook(record);
            }
        }
    }

    pub fn run_updating(
        &self,
        table: &str,
        existing: &Record,
        modifications: Modifications,
    ) -> Modifications {
        match self.tables.get(table) {
            Some(hooks) => hooks
                .updating
                .iter()
                .fold(modifications, |mods, hook| hook(existing, mods)),
            None => modifications,
        }
    }

    pub fn run_reading(&self, table: &str, record: Record) -> Record {
        match self.tables.get(table) {
            Some(hooks) => hooks.reading.iter().fold(record, |record, hook| hook(record)),
            None => record,
        }
    }
}

impl fmt::Debug for HookPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (table, hooks) in &self.tables {
            map.entry(
                table,
                &format_args!(
                    "creating: {}, updating: {}, reading: {}",
                    hooks.creating.len(),
                    hooks.updating.len(),
                    hooks.reading.len()
                ),
            );
        }
        map.finish()
    }
}

/// Rewrite `modifications` so that the committed record holds only
/// template fields.
///
/// Every field of the merged view (existing overridden by modifications)
/// is considered: template fields keep their new or existing value,
/// fields outside the template are removed if the record has them and
/// ignored otherwise.
pub fn sanitize_modifications(
    registry: &SchemaRegistry,
    table: &str,
    existing: &Record,
    modifications: Modifications,
) -> Modifications {
    let fields: BTreeSet<&String> = existing
        .keys()
        .chain(modifications.iter().map(|(field, _)| field))
        .collect();

    let mut sanitized = Modifications::new();
    for field in fields {
        if registry.is_known_field(table, field) {
            let change = match modifications.get(field) {
                Some(change) => change.clone(),
                None => existing.get(field).cloned(),
            };
            sanitized.insert(field.clone(), change);
        } else if existing.contains_key(field.as_str()) {
            sanitized.insert(field.clone(), None);
        }
    }
    sanitized
}

fn label_wallet(mut record: Record) -> Record {
    if let Some(id) = record.get("id").cloned() {
        let label = match id {
            Value::String(s) => format!("wallet-{}", s),
            other => format!("wallet-{}", other),
        };
        record.insert("wallet".into(), Value::String(label));
    }
    record
}
