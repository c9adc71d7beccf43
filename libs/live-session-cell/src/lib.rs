pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{CreateLiveSessionRequest, LiveSession};
pub use router::live_session_routes;
pub use services::LiveSessionService;
