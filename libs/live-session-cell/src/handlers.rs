// libs/live-session-cell/src/handlers.rs
use axum::extract::State;

use shared_models::error::AppError;
use shared_models::response::ApiResponse;
use shared_utils::extractor::{ApiJson, ApiQuery};
use shared_utils::AppState;

use crate::models::{CreateLiveSessionRequest, DoctorSessionsQuery, LiveSession, PatientSessionsQuery};
use crate::services::LiveSessionService;

/// `POST /live-sessions`
pub async fn create_session(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateLiveSessionRequest>,
) -> Result<ApiResponse<LiveSession>, AppError> {
    let session = LiveSessionService::new(state.store.clone())
        .create_session(request)
        .await?;

    Ok(ApiResponse::created(session))
}

/// `GET /live-sessions/doctor?doctorId=`
pub async fn list_for_doctor(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DoctorSessionsQuery>,
) -> Result<ApiResponse<Vec<LiveSession>>, AppError> {
    let doctor_id = query
        .doctor_id
        .ok_or_else(|| AppError::validation("doctorId is required"))?;

    let sessions = LiveSessionService::new(state.store.clone())
        .list_for_doctor(&doctor_id)
        .await?;

    Ok(ApiResponse::ok(sessions))
}

/// `GET /live-sessions/patient?patientId=`
pub async fn list_for_patient(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PatientSessionsQuery>,
) -> Result<ApiResponse<Vec<LiveSession>>, AppError> {
    let patient_id = query
        .patient_id
        .ok_or_else(|| AppError::validation("patientId is required"))?;

    let sessions = LiveSessionService::new(state.store.clone())
        .list_for_patient(&patient_id)
        .await?;

    Ok(ApiResponse::ok(sessions))
}
