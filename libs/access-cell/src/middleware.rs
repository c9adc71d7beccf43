use std::sync::OnceLock;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

use profile_cell::ProfileService;
use shared_database::StoreHandle;
use shared_models::auth::Identity;
use shared_models::error::AppError;
use shared_utils::extractor::resolve_identity;
use shared_utils::AppState;

use crate::models::{AccessDecision, Caller, CallerState, ONBOARDING_PATH};
use crate::services::gate::AccessGate;

/// Process-wide route table.
pub fn standard_gate() -> &'static AccessGate {
    static GATE: OnceLock<AccessGate> = OnceLock::new();
    GATE.get_or_init(AccessGate::standard)
}

/// Looks up the caller's profile on every call; nothing is cached between
/// requests.
pub async fn resolve_caller(store: StoreHandle, identity: Option<Identity>) -> Result<Caller, AppError> {
    let Some(identity) = identity else {
        return Ok(Caller::anonymous());
    };

    let profile = ProfileService::new(store).get_profile(&identity.id).await?;
    let state = match profile.and_then(|p| p.effective_role()) {
        Some(role) => CallerState::Active(role),
        None => CallerState::Onboarding,
    };

    Ok(Caller {
        identity: Some(identity),
        state,
    })
}

/// Runs every request through the route table. Must be layered on the
/// outermost router so the full request path is visible.
pub async fn access_gate(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let identity = resolve_identity(request.headers(), &state.config.identity_jwt_secret);
    let caller = resolve_caller(state.store.clone(), identity).await?;

    let decision = standard_gate().decide(&caller.state, request.method(), request.uri().path());

    match decision {
        AccessDecision::Proceed => {
            request.extensions_mut().insert(caller);
            Ok(next.run(request).await)
        }
        AccessDecision::RedirectToSignIn => {
            Err(AppError::Auth("Authentication required".to_string()))
        }
        AccessDecision::RedirectToOnboarding => {
            debug!("Caller must complete their profile before {}", request.uri().path());
            Ok(onboarding_required())
        }
        AccessDecision::Deny { required } => Err(AppError::Forbidden(format!(
            "This route requires one of the roles: {}",
            required
        ))),
    }
}

fn onboarding_required() -> Response {
    let body = Json(json!({
        "success": false,
        "message": "Profile completion required",
        "redirectTo": ONBOARDING_PATH
    }));
    (StatusCode::FORBIDDEN, body).into_response()
}
