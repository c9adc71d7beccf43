use axum::{routing::get, Router};

use shared_utils::AppState;

use crate::handlers;

/// Public: the handler resolves the caller itself.
pub fn access_routes(state: AppState) -> Router {
    Router::new()
        .route("/check", get(handlers::check_access))
        .with_state(state)
}
