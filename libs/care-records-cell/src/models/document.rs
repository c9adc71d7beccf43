use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::Collection;
use shared_models::error::AppError;
use shared_models::identifier::ProviderId;

use super::{is_http_url, no_changes, optional_text, CareRecord, Required};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    LabReport,
    Prescription,
    Imaging,
    DischargeSummary,
    Insurance,
    #[default]
    Other,
}

/// Metadata for a file already uploaded to object storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub patient_id: ProviderId,
    pub uploaded_by: Option<ProviderId>,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub category: DocumentCategory,
    pub file_name: String,
    pub file_url: String,
    pub mime_type: String,
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    pub patient_id: Option<ProviderId>,
    pub uploaded_by: Option<ProviderId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<DocumentCategory>,
    pub file_name: Option<String>,
    pub file_url: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<DocumentCategory>,
}

impl CareRecord for Document {
    const COLLECTION: Collection = Collection::Documents;
    const NAME: &'static str = "Document";

    type Create = CreateDocumentRequest;
    type Patch = UpdateDocumentRequest;

    fn from_request(request: Self::Create, config: &AppConfig, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut required = Required::default();
        let patient_id = required.value("patientId", request.patient_id);
        let title = required.text("title", request.title);
        let file_name = required.text("fileName", request.file_name);
        let file_url = required.text("fileUrl", request.file_url);
        let mime_type = required.text("mimeType", request.mime_type);
        let file_size = required.value("fileSize", request.file_size);

        let (Some(patient_id), Some(title), Some(file_name), Some(file_url), Some(mime_type), Some(file_size)) =
            (patient_id, title, file_name, file_url, mime_type, file_size)
        else {
            return Err(required.into_error());
        };

        if file_size == 0 {
            return Err(AppError::validation("fileSize must be greater than zero"));
        }
        if file_size > config.upload_max_bytes {
            return Err(AppError::validation(format!(
                "File exceeds the {} byte upload limit",
                config.upload_max_bytes
            )));
        }

        let mime_type = mime_type.to_lowercase();
        if !config.is_mime_type_allowed(&mime_type) {
            return Err(AppError::validation(format!("File type {} is not allowed", mime_type)));
        }

        if !is_http_url(&file_url) {
            return Err(AppError::validation("fileUrl must be an absolute http(s) URL"));
        }

        Ok(Document {
            id: Uuid::new_v4(),
            patient_id,
            uploaded_by: request.uploaded_by,
            title,
            description: optional_text(request.description),
            category: request.category.unwrap_or_default(),
            file_name,
            file_url,
            mime_type,
            file_size,
            created_at: now,
            updated_at: now,
        })
    }

    fn check_patch(patch: &Self::Patch, _config: &AppConfig) -> Result<(), AppError> {
        if patch.title.is_none() && patch.description.is_none() && patch.category.is_none() {
            return Err(no_changes());
        }
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::validation("title cannot be empty"));
        }
        Ok(())
    }
}
