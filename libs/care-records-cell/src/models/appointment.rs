use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::Collection;
use shared_models::error::AppError;
use shared_models::identifier::ProviderId;

use super::{no_changes, optional_text, CareRecord, DoctorScoped, Required};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    InPerson,
    Teleconsultation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: ProviderId,
    pub patient_name: Option<String>,
    pub doctor_id: Option<ProviderId>,
    pub doctor_name: Option<String>,
    pub reason: String,
    pub preferred_date: NaiveDate,
    pub preferred_time: Option<String>,
    pub appointment_type: AppointmentType,
    #[serde(default)]
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub patient_id: Option<ProviderId>,
    pub patient_name: Option<String>,
    pub doctor_id: Option<ProviderId>,
    pub doctor_name: Option<String>,
    pub reason: Option<String>,
    pub preferred_date: Option<NaiveDate>,
    pub preferred_time: Option<String>,
    pub appointment_type: Option<AppointmentType>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<ProviderId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
}

/// `HH:MM`, 24-hour clock.
fn check_time(time: &str) -> Result<(), AppError> {
    NaiveTime::parse_from_str(time, "%H:%M")
        .map(|_| ())
        .map_err(|_| AppError::validation("preferredTime must be HH:MM"))
}

impl CareRecord for Appointment {
    const COLLECTION: Collection = Collection::Appointments;
    const NAME: &'static str = "Appointment";

    type Create = CreateAppointmentRequest;
    type Patch = UpdateAppointmentRequest;

    fn from_request(request: Self::Create, _config: &AppConfig, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut required = Required::default();
        let patient_id = required.value("patientId", request.patient_id);
        let reason = required.text("reason", request.reason);
        let preferred_date = required.value("preferredDate", request.preferred_date);
        let appointment_type = required.value("appointmentType", request.appointment_type);

        let (Some(patient_id), Some(reason), Some(preferred_date), Some(appointment_type)) =
            (patient_id, reason, preferred_date, appointment_type)
        else {
            return Err(required.into_error());
        };

        if preferred_date < now.date_naive() {
            return Err(AppError::validation("preferredDate cannot be in the past"));
        }

        let preferred_time = optional_text(request.preferred_time);
        if let Some(time) = &preferred_time {
            check_time(time)?;
        }

        Ok(Appointment {
            id: Uuid::new_v4(),
            patient_id,
            patient_name: optional_text(request.patient_name),
            doctor_id: request.doctor_id,
            doctor_name: optional_text(request.doctor_name),
            reason,
            preferred_date,
            preferred_time,
            appointment_type,
            status: AppointmentStatus::Pending,
            notes: optional_text(request.notes),
            created_at: now,
            updated_at: now,
        })
    }

    fn check_patch(patch: &Self::Patch, _config: &AppConfig) -> Result<(), AppError> {
        let empty = patch.status.is_none()
            && patch.preferred_date.is_none()
            && patch.preferred_time.is_none()
            && patch.notes.is_none()
            && patch.doctor_id.is_none()
            && patch.doctor_name.is_none();
        if empty {
            return Err(no_changes());
        }

        if let Some(time) = &patch.preferred_time {
            check_time(time.trim())?;
        }
        Ok(())
    }
}

impl DoctorScoped for Appointment {}
