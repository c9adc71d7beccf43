use axum::{
    extract::State,
    middleware,
    routing::get,
    Router,
};
use serde_json::{json, Value};

use access_cell::{access_gate, access_routes};
use care_records_cell::care_records_routes;
use identity_cell::{identity_routes, webhook_routes};
use live_session_cell::live_session_routes;
use profile_cell::profile_routes;
use shared_models::error::AppError;
use shared_models::response::ApiResponse;
use shared_utils::AppState;

async fn health_check(State(state): State<AppState>) -> Result<ApiResponse<Value>, AppError> {
    state.store.ping().await?;
    Ok(ApiResponse::ok(json!({ "status": "ok", "store": "reachable" })))
}

pub fn create_router(state: AppState) -> Router {
    let system = Router::new()
        .route("/", get(|| async { "Healthdesk API is running!" }))
        .route("/health", get(health_check))
        .with_state(state.clone());

    Router::new()
        .merge(system)
        .nest("/auth", identity_routes(state.clone()))
        .nest("/webhooks", webhook_routes(state.clone()))
        .nest("/users", profile_routes(state.clone()))
        .nest("/access", access_routes(state.clone()))
        .nest("/live-sessions", live_session_routes(state.clone()))
        .merge(care_records_routes(state.clone()))
        // Outermost, so the gate sees full request paths.
        .layer(middleware::from_fn_with_state(state, access_gate))
}
