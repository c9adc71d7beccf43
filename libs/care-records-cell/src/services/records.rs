use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{Filter, StoreHandle};
use shared_models::error::AppError;
use shared_models::identifier::ProviderId;
use shared_utils::AppState;

use crate::models::notification::UpdateNotificationRequest;
use crate::models::{CareRecord, DoctorScoped, Notification};

/// CRUD over one record type. Updates read the stored record first so
/// patches can be checked against it.
pub struct RecordService<T> {
    store: StoreHandle,
    config: Arc<AppConfig>,
    _record: PhantomData<fn() -> T>,
}

impl<T: CareRecord> RecordService<T> {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            config: state.config.clone(),
            _record: PhantomData,
        }
    }

    fn parse(value: Value) -> Result<T, AppError> {
        serde_json::from_value(value)
            .map_err(|e| AppError::Database(format!("Malformed {}: {}", T::NAME.to_lowercase(), e)))
    }

    fn parse_all(rows: Vec<Value>) -> Result<Vec<T>, AppError> {
        rows.into_iter().map(Self::parse).collect()
    }

    fn not_found() -> AppError {
        AppError::NotFound(format!("{} not found", T::NAME))
    }

    pub async fn create(&self, request: T::Create) -> Result<T, AppError> {
        let record = T::from_request(request, &self.config, Utc::now())?;

        let document = serde_json::to_value(&record)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let stored = self.store.insert(T::COLLECTION, document).await?;

        info!("Created {} record", T::COLLECTION.name());
        Self::parse(stored)
    }

    /// Newest first.
    pub async fn list_for_patient(&self, patient_id: &ProviderId) -> Result<Vec<T>, AppError> {
        debug!("Listing {} for patient {}", T::COLLECTION.name(), patient_id);

        let filter = Filter::new().eq("patientId", patient_id.as_str()).newest_first();
        Self::parse_all(self.store.find(T::COLLECTION, &filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<T, AppError> {
        self.store
            .find_one(T::COLLECTION, &Filter::new().eq("id", id.to_string()))
            .await?
            .map(Self::parse)
            .transpose()?
            .ok_or_else(Self::not_found)
    }

    pub async fn update(&self, id: Uuid, patch: T::Patch) -> Result<T, AppError> {
        T::check_patch(&patch, &self.config)?;
        self.get(id).await?.check_patch_against(&patch)?;

        let mut document = serde_json::to_value(&patch)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        document["updatedAt"] = json!(Utc::now());

        let filter = Filter::new().eq("id", id.to_string());
        let mut updated = self.store.update(T::COLLECTION, &filter, document).await?;

        if updated.is_empty() {
            return Err(Self::not_found());
        }

        debug!("Updated {} {}", T::COLLECTION.name(), id);
        Self::parse(updated.swap_remove(0))
    }
}

impl<T: DoctorScoped> RecordService<T> {
    pub async fn list_for_doctor(&self, doctor_id: &ProviderId) -> Result<Vec<T>, AppError> {
        debug!("Listing {} for doctor {}", T::COLLECTION.name(), doctor_id);

        let filter = Filter::new().eq("doctorId", doctor_id.as_str()).newest_first();
        Self::parse_all(self.store.find(T::COLLECTION, &filter).await?)
    }
}

impl RecordService<Notification> {
    pub async fn mark_read(&self, id: Uuid) -> Result<Notification, AppError> {
        self.update(id, UpdateNotificationRequest::read()).await
    }

    /// Returns how many notifications flipped to read.
    pub async fn mark_all_read(&self, patient_id: &ProviderId) -> Result<usize, AppError> {
        let filter = Filter::new()
            .eq("patientId", patient_id.as_str())
            .eq("isRead", false);
        let patch = json!({ "isRead": true, "updatedAt": Utc::now() });

        let updated = self.store.update(Notification::COLLECTION, &filter, patch).await?;
        info!("Marked {} notifications read for patient {}", updated.len(), patient_id);
        Ok(updated.len())
    }
}
