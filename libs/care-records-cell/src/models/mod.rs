use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use shared_config::AppConfig;
use shared_database::Collection;
use shared_models::error::AppError;
use shared_models::identifier::ProviderId;

pub mod appointment;
pub mod document;
pub mod notification;
pub mod prescription;
pub mod vitals;

pub use appointment::{Appointment, AppointmentStatus, AppointmentType};
pub use document::{Document, DocumentCategory};
pub use notification::{Notification, NotificationKind};
pub use prescription::{Prescription, PrescriptionStatus};
pub use vitals::{Measurements, Vitals};

/// A patient-scoped record type with its own collection, create payload
/// and patch payload.
pub trait CareRecord: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;
    /// Used in messages, e.g. "Appointment not found".
    const NAME: &'static str;

    type Create: DeserializeOwned + Send + 'static;
    type Patch: Serialize + DeserializeOwned + Send + 'static;

    fn from_request(request: Self::Create, config: &AppConfig, now: DateTime<Utc>) -> Result<Self, AppError>;

    /// Rejects empty or out-of-range patches before anything is written.
    fn check_patch(patch: &Self::Patch, config: &AppConfig) -> Result<(), AppError>;

    /// Rules that span the stored record and the patch.
    fn check_patch_against(&self, _patch: &Self::Patch) -> Result<(), AppError> {
        Ok(())
    }
}

/// Records that reference a doctor through `doctorId`.
pub trait DoctorScoped: CareRecord {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientQuery {
    pub patient_id: Option<ProviderId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorQuery {
    pub doctor_id: Option<ProviderId>,
}

/// Collects the names of missing required fields.
#[derive(Debug, Default)]
pub(crate) struct Required(Vec<&'static str>);

impl Required {
    pub fn text(&mut self, field: &'static str, value: Option<String>) -> Option<String> {
        let value = optional_text(value);
        if value.is_none() {
            self.0.push(field);
        }
        value
    }

    pub fn value<T>(&mut self, field: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.0.push(field);
        }
        value
    }

    pub fn into_error(self) -> AppError {
        AppError::validation(format!("Missing required fields: {}", self.0.join(", ")))
    }
}

pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub(crate) fn no_changes() -> AppError {
    AppError::validation("No updatable fields provided")
}

pub(crate) fn is_http_url(value: &str) -> bool {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"^https?://[^\s/?#]+[^\s]*$").expect("url pattern is a valid regex"))
        .is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_reports_fields_in_order() {
        let mut required = Required::default();
        assert_eq!(required.text("title", Some("  x ".into())).as_deref(), Some("x"));
        assert!(required.text("message", Some("   ".into())).is_none());
        assert!(required.value::<u8>("kind", None).is_none());

        match required.into_error() {
            AppError::ValidationError(msg) => assert_eq!(msg, "Missing required fields: message, kind"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn http_url_check() {
        assert!(is_http_url("https://files.example.com/a.pdf"));
        assert!(is_http_url("http://localhost:9000/x"));
        assert!(!is_http_url("s3://bucket/a.pdf"));
        assert!(!is_http_url("/relative/a.pdf"));
    }
}
