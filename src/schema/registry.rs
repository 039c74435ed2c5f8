//! Closed per-table field templates.

use crate::error::{Result, StoreError};
use crate::types::Record;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use super::{AUTOPAY, NODES, SETTINGS, WALLETS};

/// Kind of value a field may hold. `null` is accepted for every kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Object,
    Any,
}

impl FieldKind {
    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (FieldKind::Any, _) => true,
            (FieldKind::String, Value::String(_)) => true,
            (FieldKind::Number, Value::Number(_)) => true,
            (FieldKind::Boolean, Value::Bool(_)) => true,
            (FieldKind::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::String => "a string",
            FieldKind::Number => "a number",
            FieldKind::Boolean => "a boolean",
            FieldKind::Object => "an object",
            FieldKind::Any => "any value",
        };
        f.write_str(name)
    }
}

/// A declared field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef { name, kind }
}

/// The instance template of a table.
#[derive(Clone, Copy, Debug)]
pub enum Template {
    /// Only the listed fields may be persisted.
    Closed(&'static [FieldDef]),
    /// Any field may be persisted.
    Open,
}

const WALLET_FIELDS: &[FieldDef] = &[
    field("id", FieldKind::Number),
    field("type", FieldKind::String),
    field("network", FieldKind::String),
    field("chain", FieldKind::String),
    field("decoder", FieldKind::String),
    field("lndconnectUri", FieldKind::String),
    field("name", FieldKind::String),
    field("alias", FieldKind::String),
    field("autopilot", FieldKind::Object),
    field("backup", FieldKind::Object),
];

const NODE_FIELDS: &[FieldDef] = &[
    field("id", FieldKind::String),
    field("hasSynced", FieldKind::Boolean),
    field("addresses", FieldKind::Object),
];

const SETTING_FIELDS: &[FieldDef] = &[
    field("key", FieldKind::String),
    field("value", FieldKind::Any),
];

/// Maps table names to their instance templates.
///
/// Tables without a registered template behave as open.
#[derive(Clone, Debug)]
pub struct SchemaRegistry {
    templates: HashMap<String, Template>,
}

impl SchemaRegistry {
    /// An empty registry: every table is open.
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Templates for the wallet application's tables.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(WALLETS, Template::Closed(WALLET_FIELDS));
        registry.register(NODES, Template::Closed(NODE_FIELDS));
        registry.register(SETTINGS, Template::Closed(SETTING_FIELDS));
        registry.register(AUTOPAY, Template::Open);
        registry
    }

    pub fn register(&mut self, table: impl Into<String>, template: Template) {
        self.templates.insert(table.into(), template);
    }

    pub fn template(&self, table: &str) -> Option<&Template> {
        self.templates.get(table)
    }

    fn field(&self, table: &str, name: &str) -> Option<FieldDef> {
        match self.templates.get(table) {
            Some(Template::Closed(fields)) => fields.iter().find(|f| f.name == name).copied(),
            _ => None,
        }
    }

    /// Whether `name` may be persisted in `table`.
    pub fn is_known_field(&self, table: &str, name: &str) -> bool {
        match self.templates.get(table) {
            Some(Template::Closed(fields)) => fields.iter().any(|f| f.name == name),
            Some(Template::Open) | None => true,
        }
    }

    /// Drop every field of `record` that `table` does not declare.
    pub fn strip_unknown(&self, table: &str, record: &mut Record) {
        record.retain(|name, _| self.is_known_field(table, name));
    }

    /// Reject a declared field holding a value of the wrong kind.
    pub fn check_kinds(&self, table: &str, record: &Record) -> Result<()> {
        for (name, value) in record {
            if let Some(def) = self.field(table, name) {
                if !def.kind.matches(value) {
                    return Err(StoreError::UnsupportedFieldKind {
                        table: table.to_string(),
                        field: name.clone(),
                        expected: def.kind,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
