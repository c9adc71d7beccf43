use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

/// Onboarding routes; every one needs a valid session token.
pub fn identity_routes(state: AppState) -> Router {
    Router::new()
        .route("/sync", post(handlers::sync_identity))
        .route("/complete-profile", post(handlers::complete_profile))
        .route("/me", get(handlers::get_me))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Webhook receiver; authenticated by signature, not by session.
pub fn webhook_routes(state: AppState) -> Router {
    Router::new()
        .route("/identity", post(handlers::identity_webhook))
        .with_state(state)
}
