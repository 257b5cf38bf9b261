//! Webhook signature verification.
//!
//! Deliveries are signed over `"{msg_id}.{timestamp}.{body}"` with
//! HMAC-SHA256. The signature header carries one or more space-separated
//! `v1,<base64>` entries (several appear while a secret is being rotated);
//! any one matching entry accepts the delivery.

use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

const ID_HEADERS: [&str; 2] = ["svix-id", "webhook-id"];
const TIMESTAMP_HEADERS: [&str; 2] = ["svix-timestamp", "webhook-timestamp"];
const SIGNATURE_HEADERS: [&str; 2] = ["svix-signature", "webhook-signature"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("invalid timestamp header")]
    InvalidTimestamp,

    #[error("timestamp outside the allowed tolerance")]
    TimestampOutOfTolerance,

    #[error("invalid signing secret")]
    InvalidSecret,

    #[error("no matching signature found")]
    VerificationFailed,
}

/// Verifies signed deliveries against one signing secret
#[derive(Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
    tolerance_secs: u64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    /// `secret` is the base64 signing secret, with or without the `whsec_` prefix
    pub fn new(secret: &str, tolerance_secs: u64) -> Result<Self, SignatureError> {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        let key = STANDARD
            .decode(encoded)
            .map_err(|_| SignatureError::InvalidSecret)?;
        if key.is_empty() {
            return Err(SignatureError::InvalidSecret);
        }

        Ok(Self {
            key,
            tolerance_secs,
        })
    }

    pub fn verify(&self, headers: &HeaderMap, payload: &[u8]) -> Result<(), SignatureError> {
        self.verify_at(headers, payload, chrono::Utc::now().timestamp())
    }

    /// Verification against an explicit clock, in unix seconds
    pub fn verify_at(&self, headers: &HeaderMap, payload: &[u8], now: i64) -> Result<(), SignatureError> {
        let msg_id = header(headers, ID_HEADERS)?;
        let timestamp = header(headers, TIMESTAMP_HEADERS)?;
        let signatures = header(headers, SIGNATURE_HEADERS)?;

        let sent_at: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;
        if now.abs_diff(sent_at) > self.tolerance_secs {
            return Err(SignatureError::TimestampOutOfTolerance);
        }

        let mac = self.mac(msg_id, timestamp.trim(), payload)?;

        let matched = signatures
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, encoded)| STANDARD.decode(encoded).ok())
            .any(|candidate| mac.clone().verify_slice(&candidate).is_ok());

        if matched {
            Ok(())
        } else {
            Err(SignatureError::VerificationFailed)
        }
    }

    /// Produce the `v1,<base64>` header entry for a payload
    pub fn sign(&self, msg_id: &str, timestamp: i64, payload: &[u8]) -> Result<String, SignatureError> {
        let mac = self.mac(msg_id, &timestamp.to_string(), payload)?;
        let digest = STANDARD.encode(mac.finalize().into_bytes());
        Ok(format!("{SIGNATURE_VERSION},{digest}"))
    }

    fn mac(&self, msg_id: &str, timestamp: &str, payload: &[u8]) -> Result<HmacSha256, SignatureError> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| SignatureError::InvalidSecret)?;
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }
}

/// First present header among the accepted aliases
fn header<'a>(headers: &'a HeaderMap, names: [&'static str; 2]) -> Result<&'a str, SignatureError> {
    names
        .iter()
        .find_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
        .ok_or(SignatureError::MissingHeader(names[0]))
}
