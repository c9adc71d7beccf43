use axum::{
    extract::State,
    http::{HeaderMap, Method},
};

use shared_models::error::AppError;
use shared_models::response::ApiResponse;
use shared_utils::extractor::{resolve_identity, ApiQuery};
use shared_utils::AppState;

use crate::middleware::{resolve_caller, standard_gate};
use crate::models::{AccessCheckQuery, AccessCheckResponse, AccessDecision};

/// `GET /access/check?path=/doctor/patients&mode=inline_notice`
///
/// Lets a dashboard page ask how it should treat the current caller.
pub async fn check_access(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<AccessCheckQuery>,
) -> Result<ApiResponse<AccessCheckResponse>, AppError> {
    let path = query
        .path
        .filter(|p| p.starts_with('/'))
        .ok_or_else(|| AppError::validation("path is required and must start with '/'"))?;

    let method = match query.method.as_deref() {
        None => Method::GET,
        Some(raw) => Method::from_bytes(raw.trim().to_uppercase().as_bytes())
            .map_err(|_| AppError::validation(format!("Unknown method: {}", raw)))?,
    };

    let identity = resolve_identity(&headers, &state.config.identity_jwt_secret);
    let caller = resolve_caller(state.store.clone(), identity).await?;

    let decision = standard_gate().decide(&caller.state, &method, &path);

    let required_roles = match decision {
        AccessDecision::Deny { required } => Some(required),
        _ => None,
    };

    Ok(ApiResponse::ok(AccessCheckResponse {
        decision: decision.as_str(),
        allowed: decision == AccessDecision::Proceed,
        authenticated: caller.identity.is_some(),
        role: caller.state.role(),
        required_roles,
        presentation: decision.present(query.mode),
        path,
    }))
}
