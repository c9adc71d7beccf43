use std::env;
use tracing::warn;

pub const DEFAULT_UPLOAD_MAX_BYTES: u64 = 50 * 1024 * 1024;

pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/dicom",
    "text/plain",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    /// PostgREST-style document API reached over HTTP.
    Rest,
    /// Process-local store, used for local development and tests.
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_api_key: String,
    pub database_backend: DatabaseBackend,
    pub identity_jwt_secret: String,
    pub identity_secret_key: String,
    pub identity_webhook_secret: String,
    pub public_api_base_url: String,
    pub upload_max_bytes: u64,
    pub upload_allowed_mime_types: Vec<String>,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            database_api_key: String::new(),
            database_backend: DatabaseBackend::Memory,
            identity_jwt_secret: String::new(),
            identity_secret_key: String::new(),
            identity_webhook_secret: String::new(),
            public_api_base_url: "http://localhost:3000".to_string(),
            upload_max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
            upload_allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|m| m.to_string())
                .collect(),
            port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| {
                warn!("DATABASE_URL not set, using empty value");
                String::new()
            });

        let database_backend = match env::var("DATABASE_BACKEND").ok().as_deref() {
            Some("memory") => DatabaseBackend::Memory,
            Some("rest") => DatabaseBackend::Rest,
            Some(other) => {
                warn!("Unknown DATABASE_BACKEND '{}', falling back to default", other);
                Self::default_backend(&database_url)
            }
            None => Self::default_backend(&database_url),
        };

        let config = Self {
            database_url,
            database_api_key: env::var("DATABASE_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("DATABASE_API_KEY not set, using empty value");
                    String::new()
                }),
            database_backend,
            identity_jwt_secret: env::var("IDENTITY_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("IDENTITY_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            identity_secret_key: env::var("IDENTITY_SECRET_KEY")
                .unwrap_or_else(|_| {
                    warn!("IDENTITY_SECRET_KEY not set, using empty value");
                    String::new()
                }),
            identity_webhook_secret: env::var("IDENTITY_WEBHOOK_SECRET")
                .unwrap_or_else(|_| {
                    warn!("IDENTITY_WEBHOOK_SECRET not set, webhooks will be rejected");
                    String::new()
                }),
            public_api_base_url: env::var("PUBLIC_API_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("PUBLIC_API_BASE_URL not set, using default");
                    defaults.public_api_base_url.clone()
                }),
            upload_max_bytes: env::var("UPLOAD_MAX_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.upload_max_bytes),
            upload_allowed_mime_types: env::var("UPLOAD_ALLOWED_MIME_TYPES")
                .ok()
                .map(|v| Self::parse_list(&v))
                .filter(|list| !list.is_empty())
                .unwrap_or(defaults.upload_allowed_mime_types),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    fn default_backend(database_url: &str) -> DatabaseBackend {
        if database_url.is_empty() {
            DatabaseBackend::Memory
        } else {
            DatabaseBackend::Rest
        }
    }

    fn parse_list(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn is_configured(&self) -> bool {
        let database_ready = match self.database_backend {
            DatabaseBackend::Memory => true,
            DatabaseBackend::Rest => !self.database_url.is_empty() && !self.database_api_key.is_empty(),
        };

        database_ready && !self.identity_jwt_secret.is_empty()
    }

    pub fn is_webhook_configured(&self) -> bool {
        !self.identity_webhook_secret.is_empty()
    }

    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        let wanted = mime_type.trim().to_lowercase();
        self.upload_allowed_mime_types.iter().any(|m| *m == wanted)
    }
}
