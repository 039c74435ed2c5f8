//! Connection string encoding for remote node credentials.
//!
//! Wallets that connect to a remote node keep their host, TLS certificate
//! and macaroon in a single encoded string. The codec is a trait so the
//! store can be opened with a substitute in tests.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Decoder identifier for wallets whose credentials live in `lndconnectUri`.
pub const LND_CONNECTION_V1: &str = "lnd-connection-v1";

const SCHEME: &str = "lndconnect://";

/// Decoded connection credentials.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub host: String,
    pub cert: String,
    pub macaroon: String,
}

impl ConnectionParams {
    pub fn new(
        host: impl Into<String>,
        cert: impl Into<String>,
        macaroon: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            cert: cert.into(),
            macaroon: macaroon.into(),
        }
    }

    /// Field by name: `host`, `cert` or `macaroon`.
    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "host" => Some(&self.host),
            "cert" => Some(&self.cert),
            "macaroon" => Some(&self.macaroon),
            _ => None,
        }
    }
}

/// Errors from encoding or decoding a connection string.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("missing connection field: {0}")]
    MissingField(&'static str),

    #[error("malformed connection string: {0}")]
    Malformed(String),
}

/// Encodes and decodes connection credentials.
pub trait ConnectionCodec: Send + Sync + fmt::Debug {
    fn encode(&self, params: &ConnectionParams) -> Result<String, CodecError>;

    fn decode(&self, encoded: &str) -> Result<ConnectionParams, CodecError>;
}

/// `lndconnect://<host>?cert=<base64url>&macaroon=<base64url>`
#[derive(Clone, Copy, Debug, Default)]
pub struct LndConnectCodec;

impl ConnectionCodec for LndConnectCodec {
    fn encode(&self, params: &ConnectionParams) -> Result<String, CodecError> {
        if params.host.is_empty() {
            return Err(CodecError::MissingField("host"));
        }
        if params.cert.is_empty() {
            return Err(CodecError::MissingField("cert"));
        }
        if params.macaroon.is_empty() {
            return Err(CodecError::MissingField("macaroon"));
        }
        if params.host.contains(['?', '&', '/', ' ']) {
            return Err(CodecError::Malformed(format!("invalid host '{}'", params.host)));
        }

        Ok(format!(
            "{}{}?cert={}&macaroon={}",
            SCHEME,
            params.host,
            URL_SAFE_NO_PAD.encode(params.cert.as_bytes()),
            URL_SAFE_NO_PAD.encode(params.macaroon.as_bytes()),
        ))
    }

    fn decode(&self, encoded: &str) -> Result<ConnectionParams, CodecError> {
        let rest = encoded
            .strip_prefix(SCHEME)
            .ok_or_else(|| CodecError::Malformed("missing lndconnect scheme".into()))?;
        let (host, query) = rest
            .split_once('?')
            .ok_or_else(|| CodecError::Malformed("missing query".into()))?;
        if host.is_empty() {
            return Err(CodecError::MissingField("host"));
        }

        let mut cert = None;
        let mut macaroon = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("cert", value)) => cert = Some(decode_part(value)?),
                Some(("macaroon", value)) => macaroon = Some(decode_part(value)?),
                _ => {}
            }
        }

        Ok(ConnectionParams {
            host: host.to_string(),
            cert: cert.ok_or(CodecError::MissingField("cert"))?,
            macaroon: macaroon.ok_or(CodecError::MissingField("macaroon"))?,
        })
    }
}

fn decode_part(value: &str) -> Result<String, CodecError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| CodecError::Malformed(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CodecError::Malformed(e.to_string()))
}
