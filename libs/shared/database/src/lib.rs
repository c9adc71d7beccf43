pub mod filter;
pub mod memory;
pub mod store;
pub mod supabase;

use std::sync::Arc;

use tracing::info;

use shared_config::{AppConfig, DatabaseBackend};

pub use filter::{Filter, SortDirection};
pub use memory::InMemoryStore;
pub use store::{Collection, DocumentStore, StoreError, StoreResult};
pub use supabase::SupabaseStore;

/// Shared handle to the process-wide store.
pub type StoreHandle = Arc<dyn DocumentStore>;

/// Builds the store selected by configuration. Called once at start-up;
/// the returned handle is injected into request state and closed on shutdown.
pub fn connect(config: &AppConfig) -> StoreResult<StoreHandle> {
    match config.database_backend {
        DatabaseBackend::Rest => {
            info!("Using REST document store at {}", config.database_url);
            Ok(Arc::new(SupabaseStore::new(config)?))
        }
        DatabaseBackend::Memory => {
            info!("Using in-memory document store");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}
