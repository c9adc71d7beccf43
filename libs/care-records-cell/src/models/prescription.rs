use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::Collection;
use shared_models::error::AppError;
use shared_models::identifier::ProviderId;

use super::{no_changes, optional_text, CareRecord, DoctorScoped, Required};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrescriptionStatus {
    #[default]
    Active,
    Completed,
    Discontinued,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: Uuid,
    pub patient_id: ProviderId,
    pub doctor_id: ProviderId,
    pub doctor_name: Option<String>,
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: Option<String>,
    pub instructions: Option<String>,
    #[serde(default)]
    pub status: PrescriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrescriptionRequest {
    pub patient_id: Option<ProviderId>,
    pub doctor_id: Option<ProviderId>,
    pub doctor_name: Option<String>,
    pub medication: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePrescriptionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PrescriptionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl CareRecord for Prescription {
    const COLLECTION: Collection = Collection::Prescriptions;
    const NAME: &'static str = "Prescription";

    type Create = CreatePrescriptionRequest;
    type Patch = UpdatePrescriptionRequest;

    fn from_request(request: Self::Create, _config: &AppConfig, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut required = Required::default();
        let patient_id = required.value("patientId", request.patient_id);
        let doctor_id = required.value("doctorId", request.doctor_id);
        let medication = required.text("medication", request.medication);
        let dosage = required.text("dosage", request.dosage);
        let frequency = required.text("frequency", request.frequency);

        let (Some(patient_id), Some(doctor_id), Some(medication), Some(dosage), Some(frequency)) =
            (patient_id, doctor_id, medication, dosage, frequency)
        else {
            return Err(required.into_error());
        };

        Ok(Prescription {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            doctor_name: optional_text(request.doctor_name),
            medication,
            dosage,
            frequency,
            duration: optional_text(request.duration),
            instructions: optional_text(request.instructions),
            status: PrescriptionStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    fn check_patch(patch: &Self::Patch, _config: &AppConfig) -> Result<(), AppError> {
        if patch.status.is_none() && patch.instructions.is_none() {
            return Err(no_changes());
        }
        Ok(())
    }
}

impl DoctorScoped for Prescription {}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn requires_prescriber_and_regimen() {
        let request: CreatePrescriptionRequest = serde_json::from_value(json!({
            "patientId": "user_p",
            "medication": "Amoxicillin"
        }))
        .unwrap();

        assert_matches!(
            Prescription::from_request(request, &AppConfig::default(), Utc::now()),
            Err(AppError::ValidationError(msg))
                if msg == "Missing required fields: doctorId, dosage, frequency"
        );
    }

    #[test]
    fn new_prescriptions_are_active() {
        let request: CreatePrescriptionRequest = serde_json::from_value(json!({
            "patientId": "user_p",
            "doctorId": "user_d",
            "medication": "Amoxicillin",
            "dosage": "500 mg",
            "frequency": "3x daily",
            "duration": "7 days"
        }))
        .unwrap();

        let prescription = Prescription::from_request(request, &AppConfig::default(), Utc::now()).unwrap();
        assert_eq!(prescription.status, PrescriptionStatus::Active);
        assert_eq!(prescription.duration.as_deref(), Some("7 days"));
    }
}
