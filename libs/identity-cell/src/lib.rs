pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{IdentityEvent, ProfileCompletion, ProfileCompletionRequest, SyncOutcome};
pub use router::{identity_routes, webhook_routes};
pub use services::sync::IdentitySyncService;
