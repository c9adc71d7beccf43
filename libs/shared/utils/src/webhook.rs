//! Signature verification for identity provider webhooks.
//!
//! Deliveries carry three headers: a message id, a unix timestamp and one or
//! more `v1,<base64>` signatures. The signed content is
//! `"{id}.{timestamp}.{body}"`, HMAC-SHA256 keyed with the base64 secret that
//! follows the `whsec_` prefix.

use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use shared_models::error::AppError;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

pub const TIMESTAMP_TOLERANCE_SECS: i64 = 5 * 60;

const SECRET_PREFIX: &str = "whsec_";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Webhook signing secret is not configured")]
    NotConfigured,

    #[error("Webhook signing secret is malformed")]
    InvalidSecret,

    #[error("Missing webhook header: {0}")]
    MissingHeader(&'static str),

    #[error("Invalid webhook timestamp")]
    InvalidTimestamp,

    #[error("Webhook timestamp outside tolerance")]
    TimestampOutOfTolerance,

    #[error("Webhook signature verification failed")]
    InvalidSignature,
}

impl From<WebhookError> for AppError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::NotConfigured | WebhookError::InvalidSecret => {
                AppError::BadRequest("Webhook verification unavailable".to_string())
            }
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

pub struct WebhookVerifier {
    keyed: HmacSha256,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> Result<Self, WebhookError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(WebhookError::NotConfigured);
        }

        let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
        let key = STANDARD
            .decode(encoded)
            .map_err(|_| WebhookError::InvalidSecret)?;
        let keyed = <HmacSha256 as Mac>::new_from_slice(&key)
            .map_err(|_| WebhookError::InvalidSecret)?;

        Ok(Self { keyed })
    }

    fn mac(&self, msg_id: &str, timestamp: i64, payload: &[u8]) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac
    }

    /// Produces a `v1,<base64>` signature for the given delivery.
    pub fn sign(&self, msg_id: &str, timestamp: i64, payload: &[u8]) -> String {
        let digest = self.mac(msg_id, timestamp, payload).finalize().into_bytes();
        format!("v1,{}", STANDARD.encode(digest))
    }

    pub fn verify(&self, headers: &HeaderMap, payload: &[u8]) -> Result<(), WebhookError> {
        self.verify_at(headers, payload, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(&self, headers: &HeaderMap, payload: &[u8], now: i64) -> Result<(), WebhookError> {
        let msg_id = header_str(headers, HEADER_ID)?;
        let timestamp_raw = header_str(headers, HEADER_TIMESTAMP)?;
        let signatures = header_str(headers, HEADER_SIGNATURE)?;

        let timestamp: i64 = timestamp_raw
            .trim()
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp)?;

        if (now - timestamp).abs() > TIMESTAMP_TOLERANCE_SECS {
            debug!("Webhook {} timestamp {} outside tolerance (now {})", msg_id, timestamp, now);
            return Err(WebhookError::TimestampOutOfTolerance);
        }

        let expected = self.mac(msg_id, timestamp, payload);

        let matched = signatures
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == "v1")
            .filter_map(|(_, sig)| STANDARD.decode(sig).ok())
            .any(|sig| expected.clone().verify_slice(&sig).is_ok());

        if matched {
            Ok(())
        } else {
            debug!("No matching signature for webhook {}", msg_id);
            Err(WebhookError::InvalidSignature)
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or(WebhookError::MissingHeader(name))
}
