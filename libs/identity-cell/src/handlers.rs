use axum::{
    body::Bytes,
    extract::{Extension, State},
    http::HeaderMap,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use profile_cell::{ProfileService, UserProfile};
use shared_models::auth::Identity;
use shared_models::error::AppError;
use shared_models::response::ApiResponse;
use shared_utils::extractor::ApiJson;
use shared_utils::webhook::WebhookVerifier;
use shared_utils::AppState;

use crate::models::{EventEnvelope, IdentityEvent, MeResponse, ProfileCompletionRequest};
use crate::services::sync::IdentitySyncService;

/// `POST /auth/sync`: called by the dashboard right after sign-in.
pub async fn sync_identity(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<ApiResponse<UserProfile>, AppError> {
    debug!("Syncing identity {}", identity.id);

    let outcome = IdentitySyncService::new(state.store.clone())
        .on_first_authentication(&identity)
        .await?;

    Ok(ApiResponse::with_status(outcome.status(), outcome.profile))
}

/// `POST /auth/complete-profile`
pub async fn complete_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<ProfileCompletionRequest>,
) -> Result<ApiResponse<UserProfile>, AppError> {
    debug!("Profile completion submitted by {}", identity.id);

    let outcome = IdentitySyncService::new(state.store.clone())
        .on_profile_completion_submitted(&identity, &request)
        .await?;

    Ok(ApiResponse::with_status(outcome.status(), outcome.profile))
}

/// `GET /auth/me`
pub async fn get_me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<ApiResponse<MeResponse>, AppError> {
    let profile = ProfileService::new(state.store.clone())
        .get_profile(&identity.id)
        .await?;

    let (is_complete, missing_fields) = match &profile {
        Some(p) => (p.is_complete(), p.missing_fields()),
        None => (false, vec!["phone", "role", "dateOfBirth", "gender"]),
    };

    Ok(ApiResponse::ok(MeResponse {
        identity_id: identity.id,
        profile,
        is_complete,
        missing_fields,
    }))
}

/// `POST /webhooks/identity`
///
/// The signature is checked against the raw body before anything is parsed
/// or written.
pub async fn identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ApiResponse<Value>, AppError> {
    let verifier = WebhookVerifier::new(&state.config.identity_webhook_secret).map_err(|e| {
        warn!("Rejecting webhook: {}", e);
        AppError::from(e)
    })?;

    verifier.verify(&headers, &body).map_err(|e| {
        warn!("Rejecting webhook: {}", e);
        AppError::from(e)
    })?;

    let envelope: EventEnvelope = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    if !matches!(envelope.event_type.as_str(), "user.updated" | "user.deleted") {
        debug!("Ignoring webhook event type {}", envelope.event_type);
        return Ok(ApiResponse::ok(json!({
            "type": envelope.event_type,
            "handled": false
        })));
    }

    let event: IdentityEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    let changed = IdentitySyncService::new(state.store.clone())
        .handle_event(&event)
        .await?;

    info!("Processed webhook {} (changed: {})", envelope.event_type, changed);

    Ok(ApiResponse::ok(json!({
        "type": envelope.event_type,
        "handled": true,
        "changed": changed
    })))
}
