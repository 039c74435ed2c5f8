//! Typed views of the records kept in each table.

use crate::codec::{CodecError, ConnectionCodec, ConnectionParams, LND_CONNECTION_V1};
use crate::error::{Result, StoreError};
use crate::types::Record;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// How a wallet reaches its node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WalletType {
    /// Node managed by the application.
    Local,
    /// Remote node configured by the user.
    Custom,
    /// Remote node exported from BTCPay Server.
    Btcpayserver,
    /// Written by another release; kept verbatim.
    Other(String),
}

impl WalletType {
    pub fn as_str(&self) -> &str {
        match self {
            WalletType::Local => "local",
            WalletType::Custom => "custom",
            WalletType::Btcpayserver => "btcpayserver",
            WalletType::Other(other) => other.as_str(),
        }
    }
}

impl From<String> for WalletType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "local" => WalletType::Local,
            "custom" => WalletType::Custom,
            "btcpayserver" => WalletType::Btcpayserver,
            _ => WalletType::Other(value),
        }
    }
}

impl From<WalletType> for String {
    fn from(value: WalletType) -> Self {
        match value {
            WalletType::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

/// Automatic channel management settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    pub active: bool,
    pub private: bool,
    pub maxchannels: u32,
    pub minchansize: u64,
    pub maxchansize: u64,
    /// Fraction of funds to allocate, 0.0 to 1.0.
    pub allocation: f64,
    pub minconfs: u32,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            active: false,
            private: true,
            maxchannels: 5,
            minchansize: 20_000,
            maxchansize: 16_777_215,
            allocation: 0.6,
            minconfs: 1,
        }
    }
}

/// A stored wallet profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub wallet_type: WalletType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lndconnect_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autopilot: Option<AutopilotConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<Value>,
}

impl Wallet {
    /// A wallet backed by a node the application runs itself.
    pub fn local(chain: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            id: None,
            wallet_type: WalletType::Local,
            network: Some(network.into()),
            chain: Some(chain.into()),
            decoder: None,
            lndconnect_uri: None,
            name: None,
            alias: None,
            autopilot: Some(AutopilotConfig::default()),
            backup: None,
        }
    }

    /// A wallet connecting to a remote node with the given credentials.
    pub fn remote(
        chain: impl Into<String>,
        network: impl Into<String>,
        params: &ConnectionParams,
        codec: &dyn ConnectionCodec,
    ) -> std::result::Result<Self, CodecError> {
        Ok(Self {
            wallet_type: WalletType::Custom,
            decoder: Some(LND_CONNECTION_V1.to_string()),
            lndconnect_uri: Some(codec.encode(params)?),
            autopilot: None,
            ..Self::local(chain, network)
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A wallet as returned by reads: the stored fields plus derived ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalletView {
    #[serde(flatten)]
    pub wallet: Wallet,
    /// `wallet-<id>`.
    #[serde(rename = "wallet", default)]
    pub label: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub cert: Option<String>,
    #[serde(default)]
    pub macaroon: Option<String>,
}

/// Per-node metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub has_synced: bool,
    /// Current address per address type.
    #[serde(default)]
    pub addresses: BTreeMap<String, String>,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn current_address(&self, address_type: &str) -> Option<&str> {
        self.addresses.get(address_type).map(String::as_str)
    }
}

/// A key-value setting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

/// A scheduled-payment rule. Parameters are opaque to the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutopayRule {
    pub id: String,
    #[serde(flatten)]
    pub params: Record,
}

/// Serialize a model into a record.
pub fn to_record<T: Serialize>(model: &T) -> Result<Record> {
    match serde_json::to_value(model)? {
        Value::Object(record) => Ok(record),
        other => Err(StoreError::Serialization(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Deserialize a record into a model.
pub fn from_record<T: DeserializeOwned>(record: Record) -> Result<T> {
    serde_json::from_value(Value::Object(record))
        .map_err(|e| StoreError::Deserialization(e.to_string()))
}
