use std::ops::RangeInclusive;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::Collection;
use shared_models::error::AppError;
use shared_models::identifier::ProviderId;

use super::{no_changes, optional_text, CareRecord, Required};

/// One set of readings. Every field is optional, but a stored record
/// carries at least one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systolic: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diastolic: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_glucose: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
}

impl Measurements {
    fn readings(&self) -> [(&'static str, Option<f64>, RangeInclusive<f64>); 9] {
        [
            ("heartRate", self.heart_rate, 20.0..=250.0),
            ("systolic", self.systolic, 50.0..=260.0),
            ("diastolic", self.diastolic, 30.0..=160.0),
            ("temperatureC", self.temperature_c, 30.0..=45.0),
            ("respiratoryRate", self.respiratory_rate, 4.0..=60.0),
            ("oxygenSaturation", self.oxygen_saturation, 50.0..=100.0),
            // mg/dL
            ("bloodGlucose", self.blood_glucose, 20.0..=600.0),
            ("weightKg", self.weight_kg, 0.5..=500.0),
            ("heightCm", self.height_cm, 20.0..=272.0),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.readings().iter().all(|(_, value, _)| value.is_none())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        for (name, value, range) in self.readings() {
            if let Some(value) = value {
                if !value.is_finite() || !range.contains(&value) {
                    return Err(AppError::validation(format!(
                        "{} must be between {} and {}",
                        name,
                        range.start(),
                        range.end()
                    )));
                }
            }
        }

        if let (Some(systolic), Some(diastolic)) = (self.systolic, self.diastolic) {
            if diastolic >= systolic {
                return Err(AppError::validation("diastolic must be lower than systolic"));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    pub id: Uuid,
    pub patient_id: ProviderId,
    pub recorded_by: Option<ProviderId>,
    #[serde(flatten)]
    pub measurements: Measurements,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVitalsRequest {
    pub patient_id: Option<ProviderId>,
    pub recorded_by: Option<ProviderId>,
    #[serde(flatten)]
    pub measurements: Measurements,
    pub notes: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVitalsRequest {
    #[serde(flatten)]
    pub measurements: Measurements,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Device clocks drift; readings a little ahead of server time are fine.
const CLOCK_SKEW_MINUTES: i64 = 5;

impl CareRecord for Vitals {
    const COLLECTION: Collection = Collection::Vitals;
    const NAME: &'static str = "Vitals record";

    type Create = CreateVitalsRequest;
    type Patch = UpdateVitalsRequest;

    fn from_request(request: Self::Create, _config: &AppConfig, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut required = Required::default();
        let Some(patient_id) = required.value("patientId", request.patient_id) else {
            return Err(required.into_error());
        };

        if request.measurements.is_empty() {
            return Err(AppError::validation("At least one measurement is required"));
        }
        request.measurements.validate()?;

        let recorded_at = request.recorded_at.unwrap_or(now);
        if recorded_at > now + Duration::minutes(CLOCK_SKEW_MINUTES) {
            return Err(AppError::validation("recordedAt cannot be in the future"));
        }

        Ok(Vitals {
            id: Uuid::new_v4(),
            patient_id,
            recorded_by: request.recorded_by,
            measurements: request.measurements,
            notes: optional_text(request.notes),
            recorded_at,
            created_at: now,
            updated_at: now,
        })
    }

    fn check_patch(patch: &Self::Patch, _config: &AppConfig) -> Result<(), AppError> {
        if patch.measurements.is_empty() && patch.notes.is_none() {
            return Err(no_changes());
        }
        patch.measurements.validate()
    }

    fn check_patch_against(&self, patch: &Self::Patch) -> Result<(), AppError> {
        let merged = Measurements {
            systolic: patch.measurements.systolic.or(self.measurements.systolic),
            diastolic: patch.measurements.diastolic.or(self.measurements.diastolic),
            ..Measurements::default()
        };
        merged.validate()
    }
}
