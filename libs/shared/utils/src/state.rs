use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::{InMemoryStore, StoreHandle};

/// Request state shared by every cell router.
///
/// The store handle is built once by the binary and injected here; nothing
/// reaches for a global connection.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: StoreHandle,
}

impl AppState {
    pub fn new(config: AppConfig, store: StoreHandle) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(config, Arc::new(InMemoryStore::new()))
    }
}
