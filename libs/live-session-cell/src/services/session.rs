// libs/live-session-cell/src/services/session.rs
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use shared_database::{Collection, Filter, StoreHandle};
use shared_models::error::AppError;
use shared_models::identifier::ProviderId;

use crate::models::{CreateLiveSessionRequest, LiveSession};

pub struct LiveSessionService {
    store: StoreHandle,
}

impl LiveSessionService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    fn parse_all(rows: Vec<Value>) -> Result<Vec<LiveSession>, AppError> {
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| AppError::Database(format!("Malformed live session: {}", e)))
            })
            .collect()
    }

    /// Validates and stores a new session. Nothing is written on a
    /// validation failure.
    pub async fn create_session(&self, request: CreateLiveSessionRequest) -> Result<LiveSession, AppError> {
        let session = request.into_session(Utc::now())?;

        let document = serde_json::to_value(&session)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let stored = self.store.insert(Collection::LiveSessions, document).await?;

        let session: LiveSession = serde_json::from_value(stored)
            .map_err(|e| AppError::Database(format!("Malformed live session: {}", e)))?;

        info!("Created live session {} for doctor {}", session.id, session.doctor_id);
        Ok(session)
    }

    pub async fn list_for_doctor(&self, doctor_id: &ProviderId) -> Result<Vec<LiveSession>, AppError> {
        debug!("Listing live sessions for doctor {}", doctor_id);

        let filter = Filter::new().eq("doctorId", doctor_id.as_str()).newest_first();
        let rows = self.store.find(Collection::LiveSessions, &filter).await?;
        Self::parse_all(rows)
    }

    /// Returns every stored session, newest first. `patient_id` is accepted
    /// but not applied: sessions carry no patient reference to filter on.
    pub async fn list_for_patient(&self, patient_id: &ProviderId) -> Result<Vec<LiveSession>, AppError> {
        warn!("Listing all live sessions for patient {} (unfiltered)", patient_id);

        let rows = self
            .store
            .find(Collection::LiveSessions, &Filter::new().newest_first())
            .await?;
        Self::parse_all(rows)
    }
}
