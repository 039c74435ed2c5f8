//! Read-time fields derived from a wallet's connection string.
//!
//! `host`, `cert` and `macaroon` are never stored. When a wallet's
//! `decoder` is [`LND_CONNECTION_V1`] they are decoded from
//! `lndconnectUri` on read. A string that fails to decode makes the
//! fields absent; the read itself still succeeds.

use crate::codec::{ConnectionCodec, ConnectionParams, LND_CONNECTION_V1};
use crate::types::Record;
use serde_json::Value;

/// Names of the derived fields.
pub const VIRTUAL_FIELDS: [&str; 3] = ["host", "cert", "macaroon"];

/// Field holding the encoded connection string.
pub const CONNECTION_FIELD: &str = "lndconnectUri";

/// Field naming how the connection string is encoded.
pub const DECODER_FIELD: &str = "decoder";

fn decode_connection(record: &Record, codec: &dyn ConnectionCodec) -> Option<ConnectionParams> {
    if record.get(DECODER_FIELD).and_then(Value::as_str) != Some(LND_CONNECTION_V1) {
        return None;
    }
    let encoded = record
        .get(CONNECTION_FIELD)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())?;

    match codec.decode(encoded) {
        Ok(params) => Some(params),
        Err(e) => {
            tracing::debug!(id = ?record.get("id"), error = %e, "connection string did not decode");
            None
        }
    }
}

/// Resolve one derived field of a raw wallet record.
pub fn resolve(record: &Record, field: &str, codec: &dyn ConnectionCodec) -> Option<String> {
    if !VIRTUAL_FIELDS.contains(&field) {
        return None;
    }
    decode_connection(record, codec).and_then(|params| params.get(field).map(str::to_string))
}

/// Return `record` with every derived field added.
///
/// Decodes at most once. Fields that cannot be resolved are left out.
pub fn with_virtual_fields(mut record: Record, codec: &dyn ConnectionCodec) -> Record {
    if let Some(params) = decode_connection(&record, codec) {
        record.insert("host".into(), Value::String(params.host));
        record.insert("cert".into(), Value::String(params.cert));
        record.insert("macaroon".into(), Value::String(params.macaroon));
    }
    record
}

/// Copy of `record` with every derived field added. The input is untouched.
pub fn augment(record: &Record, codec: &dyn ConnectionCodec) -> Record {
    with_virtual_fields(record.clone(), codec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecError, LndConnectCodec};
    use serde_json::json;

    fn wallet(decoder: &str, uri: &str) -> Record {
        json!({"id": 1, "type": "custom", "decoder": decoder, "lndconnectUri": uri})
            .as_object()
            .cloned()
            .unwrap()
    }

    fn encoded() -> String {
        LndConnectCodec
            .encode(&ConnectionParams::new("h:10009", "c", "m"))
            .unwrap()
    }

    #[test]
    fn test_resolve() {
        let record = wallet(LND_CONNECTION_V1, &encoded());
        assert_eq!(resolve(&record, "host", &LndConnectCodec).as_deref(), Some("h:10009"));
        assert_eq!(resolve(&record, "cert", &LndConnectCodec).as_deref(), Some("c"));
        assert_eq!(resolve(&record, "macaroon", &LndConnectCodec).as_deref(), Some("m"));
        assert_eq!(resolve(&record, "name", &LndConnectCodec), None);
    }

    #[test]
    fn test_resolve_other_decoder() {
        let record = wallet("something-else", &encoded());
        assert_eq!(resolve(&record, "host", &LndConnectCodec), None);
    }

    #[test]
    fn test_malformed_string_is_absent() {
        let record = wallet(LND_CONNECTION_V1, "lndconnect://broken");
        assert_eq!(resolve(&record, "host", &LndConnectCodec), None);

        let augmented = augment(&record, &LndConnectCodec);
        assert!(!augmented.contains_key("host"));
        assert_eq!(augmented, record);
    }

    #[test]
    fn test_augment_leaves_input_untouched() {
        let record = wallet(LND_CONNECTION_V1, &encoded());
        let augmented = augment(&record, &LndConnectCodec);
        assert_eq!(augmented.get("host"), Some(&json!("h:10009")));
        assert!(!record.contains_key("host"));
    }

    #[derive(Debug)]
    struct CountingCodec(std::sync::atomic::AtomicUsize);

    impl ConnectionCodec for CountingCodec {
        fn encode(&self, _: &ConnectionParams) -> Result<String, CodecError> {
            Ok("x".into())
        }

        fn decode(&self, _: &str) -> Result<ConnectionParams, CodecError> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(ConnectionParams::new("h", "c", "m"))
        }
    }

    #[test]
    fn test_augment_decodes_once() {
        let codec = CountingCodec(Default::default());
        let record = wallet(LND_CONNECTION_V1, "anything");
        let augmented = with_virtual_fields(record, &codec);
        assert_eq!(augmented.get("macaroon"), Some(&json!("m")));
        assert_eq!(codec.0.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
