use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use axum::http::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::{AppConfig, DatabaseBackend};
use shared_models::auth::Identity;

use crate::state::AppState;
use crate::webhook::{WebhookVerifier, HEADER_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP};

/// `whsec_` + base64("test-webhook-signing-key").
pub const TEST_WEBHOOK_SECRET: &str = "whsec_dGVzdC13ZWJob29rLXNpZ25pbmcta2V5";

pub struct TestConfig {
    pub jwt_secret: String,
    pub webhook_secret: String,
    pub database_url: String,
    pub database_api_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
            database_url: String::new(),
            database_api_key: "test-api-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        let backend = if self.database_url.is_empty() {
            DatabaseBackend::Memory
        } else {
            DatabaseBackend::Rest
        };

        AppConfig {
            database_url: self.database_url.clone(),
            database_api_key: self.database_api_key.clone(),
            database_backend: backend,
            identity_jwt_secret: self.jwt_secret.clone(),
            identity_secret_key: "sk_test_identity".to_string(),
            identity_webhook_secret: self.webhook_secret.clone(),
            ..AppConfig::default()
        }
    }

    /// State backed by a fresh in-memory store.
    pub fn to_state(&self) -> AppState {
        AppState::in_memory(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", "Test", "User")
    }
}

impl TestUser {
    pub fn new(email: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            id: format!("user_{}", Uuid::new_v4().simple()),
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }

    pub fn with_id(id: &str, email: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::new(email, "Test", "User")
        }
    }

    pub fn to_identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            email: Some(self.email.to_lowercase()),
            first_name: Some(self.first_name.clone()),
            last_name: Some(self.last_name.clone()),
            photo_url: None,
            issued_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "given_name": user.first_name,
            "family_name": user.last_name,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    pub fn bearer(user: &TestUser, config: &AppConfig) -> String {
        format!("Bearer {}", Self::create_test_token(user, &config.identity_jwt_secret, Some(24)))
    }
}

pub struct WebhookTestUtils;

impl WebhookTestUtils {
    pub fn signed_headers(secret: &str, msg_id: &str, timestamp: i64, payload: &[u8]) -> HeaderMap {
        let verifier = WebhookVerifier::new(secret).expect("test webhook secret is valid");
        let signature = verifier.sign(msg_id, timestamp, payload);

        let mut headers = HeaderMap::new();
        headers.insert(HEADER_ID, HeaderValue::from_str(msg_id).expect("valid msg id"));
        headers.insert(HEADER_TIMESTAMP, HeaderValue::from_str(&timestamp.to_string()).expect("valid timestamp"));
        headers.insert(HEADER_SIGNATURE, HeaderValue::from_str(&signature).expect("valid signature"));
        headers
    }

    pub fn user_updated_event(user_id: &str, email: &str, first_name: &str, last_name: &str) -> Value {
        json!({
            "type": "user.updated",
            "object": "event",
            "data": {
                "id": user_id,
                "first_name": first_name,
                "last_name": last_name,
                "image_url": "https://img.example.com/avatar.png",
                "primary_email_address_id": "idn_1",
                "email_addresses": [
                    { "id": "idn_0", "email_address": "old@example.com" },
                    { "id": "idn_1", "email_address": email }
                ]
            }
        })
    }

    pub fn user_deleted_event(user_id: &str) -> Value {
        json!({
            "type": "user.deleted",
            "object": "event",
            "data": { "id": user_id, "deleted": true }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();

        assert_eq!(config.database_backend, DatabaseBackend::Memory);
        assert!(config.is_configured());
        assert!(config.is_webhook_configured());
    }

    #[test]
    fn test_user_identity() {
        let user = TestUser::new("Doc@Example.com", "Gregory", "House");
        let identity = user.to_identity();
        assert_eq!(identity.id, user.id);
        assert_eq!(identity.email.as_deref(), Some("doc@example.com"));
        assert_eq!(identity.display_name().as_deref(), Some("Gregory House"));
    }

    #[test]
    fn test_jwt_token_creation() {
        let token = JwtTestUtils::create_test_token(&TestUser::default(), "test-secret", Some(1));
        assert_eq!(token.split('.').count(), 3);
    }
}
