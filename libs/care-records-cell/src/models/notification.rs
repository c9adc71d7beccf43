use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::Collection;
use shared_models::error::AppError;
use shared_models::identifier::ProviderId;

use super::{no_changes, CareRecord, Required};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Appointment,
    Prescription,
    Vitals,
    Document,
    #[default]
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub patient_id: ProviderId,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    pub patient_id: Option<ProviderId>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub kind: Option<NotificationKind>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotificationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
}

impl UpdateNotificationRequest {
    pub fn read() -> Self {
        Self { is_read: Some(true) }
    }
}

impl CareRecord for Notification {
    const COLLECTION: Collection = Collection::Notifications;
    const NAME: &'static str = "Notification";

    type Create = CreateNotificationRequest;
    type Patch = UpdateNotificationRequest;

    fn from_request(request: Self::Create, _config: &AppConfig, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut required = Required::default();
        let patient_id = required.value("patientId", request.patient_id);
        let title = required.text("title", request.title);
        let message = required.text("message", request.message);

        let (Some(patient_id), Some(title), Some(message)) = (patient_id, title, message) else {
            return Err(required.into_error());
        };

        Ok(Notification {
            id: Uuid::new_v4(),
            patient_id,
            title,
            message,
            kind: request.kind.unwrap_or_default(),
            is_read: false,
            created_at: now,
            updated_at: now,
        })
    }

    fn check_patch(patch: &Self::Patch, _config: &AppConfig) -> Result<(), AppError> {
        match patch.is_read {
            Some(_) => Ok(()),
            None => Err(no_changes()),
        }
    }
}
