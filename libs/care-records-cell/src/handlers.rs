use axum::extract::{Path, State};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::response::ApiResponse;
use shared_utils::extractor::{ApiJson, ApiQuery};
use shared_utils::AppState;

use crate::models::{CareRecord, DoctorQuery, DoctorScoped, Notification, PatientQuery};
use crate::services::RecordService;

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::validation(format!("Invalid record id: {}", raw)))
}

// ==============================================================================
// GENERIC RECORD HANDLERS
// ==============================================================================

/// `POST /{kind}`
pub async fn create_record<T: CareRecord>(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<T::Create>,
) -> Result<ApiResponse<T>, AppError> {
    let record = RecordService::<T>::new(&state).create(request).await?;
    Ok(ApiResponse::created(record))
}

/// `GET /{kind}?patientId=`
pub async fn list_records<T: CareRecord>(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PatientQuery>,
) -> Result<ApiResponse<Vec<T>>, AppError> {
    let patient_id = query
        .patient_id
        .ok_or_else(|| AppError::validation("patientId is required"))?;

    let records = RecordService::<T>::new(&state).list_for_patient(&patient_id).await?;
    Ok(ApiResponse::ok(records))
}

/// `GET /{kind}/{id}`
pub async fn get_record<T: CareRecord>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<T>, AppError> {
    let record = RecordService::<T>::new(&state).get(parse_id(&id)?).await?;
    Ok(ApiResponse::ok(record))
}

/// `PATCH /{kind}/{id}`
pub async fn update_record<T: CareRecord>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<T::Patch>,
) -> Result<ApiResponse<T>, AppError> {
    let record = RecordService::<T>::new(&state).update(parse_id(&id)?, patch).await?;
    Ok(ApiResponse::ok(record))
}

/// `GET /{kind}/doctor?doctorId=`
pub async fn list_for_doctor<T: DoctorScoped>(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DoctorQuery>,
) -> Result<ApiResponse<Vec<T>>, AppError> {
    let doctor_id = query
        .doctor_id
        .ok_or_else(|| AppError::validation("doctorId is required"))?;

    let records = RecordService::<T>::new(&state).list_for_doctor(&doctor_id).await?;
    Ok(ApiResponse::ok(records))
}

// ==============================================================================
// NOTIFICATIONS
// ==============================================================================

/// `PATCH /notifications/{id}/read`
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Notification>, AppError> {
    let notification = RecordService::<Notification>::new(&state)
        .mark_read(parse_id(&id)?)
        .await?;
    Ok(ApiResponse::ok(notification))
}

/// `PATCH /notifications/read-all?patientId=`
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PatientQuery>,
) -> Result<ApiResponse<Value>, AppError> {
    let patient_id = query
        .patient_id
        .ok_or_else(|| AppError::validation("patientId is required"))?;

    let updated = RecordService::<Notification>::new(&state)
        .mark_all_read(&patient_id)
        .await?;
    Ok(ApiResponse::ok(json!({ "updated": updated })))
}
