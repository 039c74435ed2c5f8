//! Error types for the wallet store.

use crate::defaults::DefaultsError;
use crate::path::PathError;
use crate::schema::FieldKind;
use crate::types::Key;
use thiserror::Error;

/// Main error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Checksum mismatch: expected {expected}, got {got}")]
    ChecksumMismatch { expected: u32, got: u32 },

    #[error("Invalid store format: {0}")]
    InvalidFormat(String),

    #[error("Store is locked by another process")]
    Locked,

    #[error("Store not initialized")]
    NotInitialized,

    #[error("Invalid store name: {0}")]
    InvalidName(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown index {index} on table {table}")]
    UnknownIndex { table: String, index: String },

    #[error("Record not found in {table}: {key}")]
    RecordNotFound { table: String, key: Key },

    #[error("Record already exists in {table}: {key}")]
    RecordExists { table: String, key: Key },

    #[error("Record in {table} is missing its primary key field {field}")]
    MissingPrimaryKey { table: String, field: String },

    #[error("Key {key} in {table} leaves no room for the next id")]
    KeyOutOfRange { table: String, key: Key },

    #[error("Cannot change primary key of {key} in {table}")]
    PrimaryKeyChange { table: String, key: Key },

    #[error("Field {field} in {table} must be {expected}")]
    UnsupportedFieldKind {
        table: String,
        field: String,
        expected: FieldKind,
    },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Upgrade to version {version} failed: {reason}")]
    Transition { version: u32, reason: String },

    #[error("Store is at schema version {persisted}, but this build only knows up to {known}")]
    Downgrade { persisted: u32, known: u32 },

    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Defaults lookup failed: {0}")]
    Defaults(#[from] DefaultsError),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for StoreError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for StoreError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        StoreError::Deserialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
