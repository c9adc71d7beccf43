use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use shared_models::error::AppError;

use crate::filter::Filter;

/// One collection per record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    LiveSessions,
    Vitals,
    Documents,
    Appointments,
    Notifications,
    Prescriptions,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::LiveSessions => "live_sessions",
            Collection::Vitals => "vitals",
            Collection::Documents => "documents",
            Collection::Appointments => "appointments",
            Collection::Notifications => "notifications",
            Collection::Prescriptions => "prescriptions",
        }
    }

    /// Fields carrying a unique constraint in the backing store.
    pub fn unique_keys(&self) -> &'static [&'static str] {
        match self {
            Collection::Users => &["id", "externalId", "email"],
            _ => &["id"],
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Store request failed ({status}): {message}")]
    Request { status: u16, message: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store configuration error: {0}")]
    Configuration(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Database(other.to_string()),
        }
    }
}

/// Flat document persistence. Every call reads or writes current state;
/// implementations keep no cache.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts one document and returns it as stored.
    async fn insert(&self, collection: Collection, document: Value) -> StoreResult<Value>;

    async fn find(&self, collection: Collection, filter: &Filter) -> StoreResult<Vec<Value>>;

    /// Applies a shallow patch to every matching document and returns them.
    async fn update(&self, collection: Collection, filter: &Filter, patch: Value) -> StoreResult<Vec<Value>>;

    /// Deletes matching documents and returns how many were removed.
    async fn delete(&self, collection: Collection, filter: &Filter) -> StoreResult<usize>;

    async fn ping(&self) -> StoreResult<()>;

    async fn close(&self) -> StoreResult<()>;

    async fn find_one(&self, collection: Collection, filter: &Filter) -> StoreResult<Option<Value>> {
        let limited = filter.clone().limit(1);
        let mut found = self.find(collection, &limited).await?;
        Ok(if found.is_empty() { None } else { Some(found.swap_remove(0)) })
    }
}
