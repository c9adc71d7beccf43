use axum::{
    Router,
    routing::get,
    middleware,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn profile_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::list_users_by_role))
        .route("/{identity_id}", get(handlers::get_user))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
