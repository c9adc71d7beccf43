// libs/live-session-cell/src/router.rs
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers::*;

pub fn live_session_routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_session))
        .route("/doctor", get(list_for_doctor))
        .route("/patient", get(list_for_patient))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
