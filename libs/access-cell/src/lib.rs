pub mod handlers;
pub mod middleware;
pub mod models;
pub mod router;
pub mod services;

pub use middleware::{access_gate, resolve_caller, standard_gate};
pub use models::{AccessDecision, Caller, CallerState, DenialMode, RoleSet};
pub use router::access_routes;
pub use services::gate::{AccessGate, RoutePolicy};
