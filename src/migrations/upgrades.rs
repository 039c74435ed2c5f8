//! The wallet application's schema history.

use super::{MigrationChain, RecordAction, SchemaVersion, Transaction, UpgradeContext};
use crate::codec::{CodecError, ConnectionParams, LND_CONNECTION_V1};
use crate::defaults::DefaultsSource;
use crate::error::Result;
use crate::path::{get_in_record, set_in_record};
use crate::schema::{AUTOPAY, NODES, SETTINGS, WALLETS};
use crate::types::Record;
use crate::virtual_fields::{CONNECTION_FIELD, DECODER_FIELD};
use serde_json::Value;

/// Connection fields that older releases stored in plaintext.
const LEGACY_CONNECTION_FIELDS: [&str; 4] = ["host", "cert", "macaroon", "string"];

/// Flat autopilot fields of older wallets and their nested names.
const LEGACY_AUTOPILOT_FIELDS: [(&str, &str); 6] = [
    ("autopilotMaxchannels", "maxchannels"),
    ("autopilotAllocation", "allocation"),
    ("autopilotMinchansize", "minchansize"),
    ("autopilotMaxchansize", "maxchansize"),
    ("autopilotPrivate", "private"),
    ("autopilotMinconfs", "minconfs"),
];

/// Key of the settings record holding configuration overrides.
pub const CONFIG_KEY: &str = "config";

/// Every schema version the application has shipped.
pub fn standard_chain() -> MigrationChain {
    MigrationChain {
        versions: vec![
            SchemaVersion::new(1)
                .store(SETTINGS, "key")
                .store(WALLETS, "++id, type, chain, network")
                .store(NODES, "id"),
            SchemaVersion::new(2).upgrade(wallets_to_lndconnect),
            SchemaVersion::new(3).store(AUTOPAY, "id"),
            SchemaVersion::new(4).upgrade(settings_to_config),
        ],
    }
}

/// v2: fold plaintext remote-node credentials into one encoded string,
/// and the flat autopilot fields into a nested `autopilot` object.
///
/// A remote wallet whose credentials cannot be encoded is deleted rather
/// than kept half-migrated.
pub fn wallets_to_lndconnect(tx: &mut Transaction<'_>, ctx: &UpgradeContext<'_>) -> Result<()> {
    let summary = tx.modify(WALLETS, |wallet| {
        wallet.insert(DECODER_FIELD.into(), Value::from(LND_CONNECTION_V1));

        let is_remote = matches!(
            wallet.get("type").and_then(Value::as_str),
            Some("custom" | "btcpayserver")
        );
        if is_remote {
            match legacy_params(wallet).and_then(|params| ctx.codec.encode(&params)) {
                Ok(encoded) => {
                    wallet.insert("type".into(), Value::from("custom"));
                    wallet.insert(CONNECTION_FIELD.into(), Value::String(encoded));
                }
                Err(e) => {
                    tracing::warn!(
                        id = ?wallet.get("id"),
                        error = %e,
                        "deleting wallet whose connection settings could not be migrated"
                    );
                    return RecordAction::Delete;
                }
            }
        }

        for field in LEGACY_CONNECTION_FIELDS {
            wallet.remove(field);
        }
        fold_legacy_autopilot(wallet);
        RecordAction::Keep
    })?;

    tracing::info!(
        kept = summary.kept,
        deleted = summary.deleted,
        "migrated wallet connection settings"
    );
    Ok(())
}

/// `autopilot: bool` becomes `autopilot.active`; `autopilotX` becomes
/// `autopilot.X`. Null flat fields are dropped.
fn fold_legacy_autopilot(wallet: &mut Record) {
    let mut nested = match wallet.remove("autopilot") {
        Some(Value::Object(nested)) => Some(nested),
        Some(Value::Bool(active)) => {
            let mut nested = Record::new();
            nested.insert("active".into(), Value::Bool(active));
            Some(nested)
        }
        _ => None,
    };

    for (legacy, field) in LEGACY_AUTOPILOT_FIELDS {
        match wallet.remove(legacy) {
            Some(Value::Null) | None => {}
            Some(value) => {
                nested
                    .get_or_insert_with(Record::new)
                    .insert(field.into(), value);
            }
        }
    }

    if let Some(nested) = nested {
        wallet.insert("autopilot".into(), Value::Object(nested));
    }
}

fn legacy_params(wallet: &Record) -> std::result::Result<ConnectionParams, CodecError> {
    let field = |name: &'static str| {
        wallet
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(CodecError::MissingField(name))
    };
    Ok(ConnectionParams {
        host: field("host")?,
        cert: field("cert")?,
        macaroon: field("macaroon")?,
    })
}

/// Where a legacy setting lands in the configuration overrides.
#[derive(Clone, Copy)]
pub struct LegacySetting {
    /// Settings record key.
    pub key: &'static str,
    /// Path of the value inside the settings record.
    pub source_path: &'static str,
    /// Destination path in the configuration.
    pub config_path: &'static str,
    /// Value translation; `None` from the mapper means nothing to migrate.
    pub mapper: Option<fn(&Value) -> Option<Value>>,
}

/// Settings folded into the `config` record by v4.
pub const LEGACY_SETTINGS: &[LegacySetting] = &[
    LegacySetting {
        key: "theme",
        source_path: "value",
        config_path: "theme",
        mapper: None,
    },
    LegacySetting {
        key: "locale",
        source_path: "value",
        config_path: "locale",
        mapper: None,
    },
    LegacySetting {
        key: "fiatTicker",
        source_path: "value",
        config_path: "currency",
        mapper: None,
    },
    LegacySetting {
        key: "channelViewMode",
        source_path: "value",
        config_path: "channels.viewMode",
        mapper: Some(channel_view_mode),
    },
    LegacySetting {
        key: "chain.bitcoin",
        source_path: "value.unit",
        config_path: "units.bitcoin",
        mapper: None,
    },
    LegacySetting {
        key: "chain.litecoin",
        source_path: "value.unit",
        config_path: "units.litecoin",
        mapper: None,
    },
    LegacySetting {
        key: "chain.groestlcoin",
        source_path: "value.unit",
        config_path: "units.groestlcoin",
        mapper: None,
    },
];

fn channel_view_mode(value: &Value) -> Option<Value> {
    match value.as_str()? {
        "CHANNEL_LIST_VIEW_MODE_SUMMARY" => Some(Value::from("summary")),
        "CHANNEL_LIST_VIEW_MODE_CARD" => Some(Value::from("card")),
        _ => None,
    }
}

/// v4: replace legacy settings records with one `config` overrides record.
///
/// Matched settings are always deleted. Only values that are set and
/// differ from the default survive as overrides. A setting that fails to
/// migrate is dropped on its own.
pub fn settings_to_config(tx: &mut Transaction<'_>, ctx: &UpgradeContext<'_>) -> Result<()> {
    let mut overrides = Record::new();
    let mut migrated = 0usize;

    let summary = tx.modify(SETTINGS, |setting| {
        let key = setting.get("key").and_then(Value::as_str);
        let legacy = match LEGACY_SETTINGS.iter().find(|l| Some(l.key) == key) {
            Some(legacy) => legacy,
            None => return RecordAction::Keep,
        };

        match migrate_setting(legacy, setting, ctx.defaults, &mut overrides) {
            Ok(true) => migrated += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(
                    key = legacy.key,
                    error = %e,
                    "dropping setting that could not be migrated"
                );
            }
        }
        RecordAction::Delete
    })?;

    let mut config = Record::new();
    config.insert("key".into(), Value::from(CONFIG_KEY));
    config.insert("value".into(), Value::Object(overrides));
    tx.put(SETTINGS, config)?;

    tracing::info!(
        removed = summary.deleted,
        migrated,
        "migrated legacy settings to config overrides"
    );
    Ok(())
}

fn migrate_setting(
    legacy: &LegacySetting,
    setting: &Record,
    defaults: &dyn DefaultsSource,
    overrides: &mut Record,
) -> Result<bool> {
    let default = defaults.default_at(legacy.config_path)?;

    let mut value = get_in_record(setting, legacy.source_path).cloned();
    if let Some(mapper) = legacy.mapper {
        value = value.as_ref().and_then(mapper);
    }

    match value {
        Some(value) if is_truthy(&value) && default.as_ref() != Some(&value) => {
            set_in_record(overrides, legacy.config_path, value)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{ConnectionCodec, LndConnectCodec};
    use crate::defaults::{builtin_defaults, DefaultsError};
    use crate::storage::Tables;
    use crate::types::Key;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn tables_at(version: u32) -> Tables {
        standard_chain().up_to(version).initial_tables().unwrap()
    }

    #[test]
    fn test_standard_chain_shape() {
        let chain = standard_chain();
        assert_eq!(chain.latest(), 4);
        let tables = chain.initial_tables().unwrap();
        assert_eq!(
            tables.table_names(),
            vec!["autopay", "nodes", "settings", "wallets"]
        );
        assert!(tables.table(WALLETS).unwrap().def().primary_key.auto_increment);
    }

    #[test]
    fn test_wallets_to_lndconnect() {
        let mut tables = tables_at(1);
        let wallets = tables.table_mut(WALLETS).unwrap();
        wallets
            .put(record(json!({"type": "local", "chain": "bitcoin", "host": "stale"})))
            .unwrap();
        wallets
            .put(record(json!({
                "type": "btcpayserver",
                "host": "h",
                "cert": "c",
                "macaroon": "m",
                "string": "old"
            })))
            .unwrap();
        wallets
            .put(record(json!({"type": "custom", "host": "h", "cert": "c"})))
            .unwrap();

        let defaults = builtin_defaults();
        let ctx = UpgradeContext { defaults: &defaults, codec: &LndConnectCodec };
        let mut tx = Transaction::new(&mut tables, 2);
        wallets_to_lndconnect(&mut tx, &ctx).unwrap();

        let wallets = tables.table(WALLETS).unwrap();
        assert_eq!(wallets.len(), 2);

        let local = wallets.get(&Key::Int(1)).unwrap();
        assert_eq!(local["decoder"], json!(LND_CONNECTION_V1));
        assert!(!local.contains_key("host"));
        assert!(!local.contains_key(CONNECTION_FIELD));

        let remote = wallets.get(&Key::Int(2)).unwrap();
        assert_eq!(remote["type"], json!("custom"));
        for legacy in LEGACY_CONNECTION_FIELDS {
            assert!(!remote.contains_key(legacy));
        }
        let uri = remote[CONNECTION_FIELD].as_str().unwrap();
        assert_eq!(
            LndConnectCodec.decode(uri).unwrap(),
            ConnectionParams::new("h", "c", "m")
        );

        assert!(wallets.get(&Key::Int(3)).is_none());
    }

    #[test]
    fn test_legacy_autopilot_is_nested() {
        let mut tables = tables_at(1);
        let wallets = tables.table_mut(WALLETS).unwrap();
        wallets
            .put(record(json!({
                "type": "local",
                "autopilot": true,
                "autopilotMaxchannels": 8,
                "autopilotAllocation": 0.4,
                "autopilotPrivate": false,
                "autopilotMinconfs": null
            })))
            .unwrap();
        wallets
            .put(record(json!({"type": "local", "autopilot": {"active": false}})))
            .unwrap();
        wallets.put(record(json!({"type": "local"}))).unwrap();

        let defaults = builtin_defaults();
        let ctx = UpgradeContext { defaults: &defaults, codec: &LndConnectCodec };
        let mut tx = Transaction::new(&mut tables, 2);
        wallets_to_lndconnect(&mut tx, &ctx).unwrap();

        let wallets = tables.table(WALLETS).unwrap();
        let legacy = wallets.get(&Key::Int(1)).unwrap();
        assert_eq!(
            legacy["autopilot"],
            json!({"active": true, "maxchannels": 8, "allocation": 0.4, "private": false})
        );
        for (flat, _) in LEGACY_AUTOPILOT_FIELDS {
            assert!(!legacy.contains_key(flat));
        }

        let nested = wallets.get(&Key::Int(2)).unwrap();
        assert_eq!(nested["autopilot"], json!({"active": false}));
        assert!(!wallets.get(&Key::Int(3)).unwrap().contains_key("autopilot"));
    }

    #[test]
    fn test_channel_view_mode_mapper() {
        assert_eq!(
            channel_view_mode(&json!("CHANNEL_LIST_VIEW_MODE_SUMMARY")),
            Some(json!("summary"))
        );
        assert_eq!(
            channel_view_mode(&json!("CHANNEL_LIST_VIEW_MODE_CARD")),
            Some(json!("card"))
        );
        assert_eq!(channel_view_mode(&json!("CHANNEL_LIST_VIEW_MODE_GRID")), None);
        assert_eq!(channel_view_mode(&json!(3)), None);
    }

    #[test]
    fn test_settings_to_config() {
        let mut tables = tables_at(3);
        let settings = tables.table_mut(SETTINGS).unwrap();
        for setting in [
            json!({"key": "theme", "value": "dark"}),
            json!({"key": "locale", "value": "de"}),
            json!({"key": "fiatTicker", "value": "EUR"}),
            json!({"key": "channelViewMode", "value": "CHANNEL_LIST_VIEW_MODE_SUMMARY"}),
            json!({"key": "chain.bitcoin", "value": {"unit": "btc"}}),
            json!({"key": "chain.litecoin", "value": {"unit": "lits"}}),
            json!({"key": "chain.groestlcoin", "value": {}}),
            json!({"key": "activeWallet", "value": 1}),
        ] {
            settings.put(record(setting)).unwrap();
        }

        let defaults = builtin_defaults();
        let ctx = UpgradeContext { defaults: &defaults, codec: &LndConnectCodec };
        let mut tx = Transaction::new(&mut tables, 4);
        settings_to_config(&mut tx, &ctx).unwrap();

        let settings = tables.table(SETTINGS).unwrap();
        assert_eq!(settings.keys(), vec![Key::from("activeWallet"), Key::from("config")]);
        assert_eq!(
            settings.get(&Key::from("config")).unwrap()["value"],
            json!({
                "locale": "de",
                "currency": "EUR",
                "channels": {"viewMode": "summary"},
                "units": {"bitcoin": "btc"}
            })
        );
    }

    #[derive(Debug)]
    struct FailingDefaults;

    impl DefaultsSource for FailingDefaults {
        fn default_at(&self, path: &str) -> std::result::Result<Option<Value>, DefaultsError> {
            if path == "locale" {
                Err(DefaultsError::Unavailable(path.to_string()))
            } else {
                builtin_defaults().default_at(path)
            }
        }
    }

    #[test]
    fn test_failed_setting_is_dropped_alone() {
        let mut tables = tables_at(3);
        let settings = tables.table_mut(SETTINGS).unwrap();
        settings.put(record(json!({"key": "locale", "value": "fr"}))).unwrap();
        settings.put(record(json!({"key": "theme", "value": "light"}))).unwrap();

        let ctx = UpgradeContext { defaults: &FailingDefaults, codec: &LndConnectCodec };
        let mut tx = Transaction::new(&mut tables, 4);
        settings_to_config(&mut tx, &ctx).unwrap();

        let settings = tables.table(SETTINGS).unwrap();
        assert_eq!(settings.len(), 1);
        assert_eq!(
            settings.get(&Key::from("config")).unwrap()["value"],
            json!({"theme": "light"})
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!({})));
    }
}
