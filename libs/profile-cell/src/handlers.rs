use axum::extract::{Path, State};

use shared_models::error::AppError;
use shared_models::response::ApiResponse;
use shared_models::role::Role;
use shared_utils::extractor::ApiQuery;
use shared_utils::AppState;

use crate::models::{UserProfile, UsersByRoleQuery};
use crate::services::profile::ProfileService;

/// `GET /users?role=doctor`
pub async fn list_users_by_role(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UsersByRoleQuery>,
) -> Result<ApiResponse<Vec<UserProfile>>, AppError> {
    let role: Role = query
        .role
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| AppError::validation("role is required"))?
        .parse()
        .map_err(AppError::ValidationError)?;

    let profiles = ProfileService::new(state.store.clone())
        .list_by_role(role)
        .await?;

    Ok(ApiResponse::ok(profiles))
}

/// `GET /users/{identity_id}`
pub async fn get_user(
    State(state): State<AppState>,
    Path(identity_id): Path<String>,
) -> Result<ApiResponse<UserProfile>, AppError> {
    ProfileService::new(state.store.clone())
        .get_profile(&identity_id)
        .await?
        .map(ApiResponse::ok)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}
