// libs/live-session-cell/src/models.rs
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::identifier::ProviderId;

fn session_url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"^https?://[^\s/?#]+[^\s]*$").expect("session url pattern is a valid regex"))
}

/// Stored pointer to an externally hosted meeting room. Never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSession {
    pub id: Uuid,
    pub session_name: String,
    pub session_url: String,
    pub doctor_id: ProviderId,
    pub doctor_name: Option<String>,
    pub doctor_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLiveSessionRequest {
    pub session_name: Option<String>,
    pub session_url: Option<String>,
    #[serde(default)]
    pub doctor_id: Option<ProviderId>,
    pub doctor_name: Option<String>,
    pub doctor_email: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl CreateLiveSessionRequest {
    pub fn into_session(self, now: DateTime<Utc>) -> Result<LiveSession, AppError> {
        let session_name = present(self.session_name);
        let session_url = present(self.session_url);

        let mut missing = Vec::new();
        if session_name.is_none() {
            missing.push("sessionName");
        }
        if session_url.is_none() {
            missing.push("sessionUrl");
        }
        if self.doctor_id.is_none() {
            missing.push("doctorId");
        }

        let (Some(session_name), Some(session_url), Some(doctor_id)) =
            (session_name, session_url, self.doctor_id)
        else {
            return Err(AppError::validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        if !session_url_regex().is_match(&session_url) {
            return Err(AppError::validation("sessionUrl must be an absolute http(s) URL"));
        }

        Ok(LiveSession {
            id: Uuid::new_v4(),
            session_name,
            session_url,
            doctor_id,
            doctor_name: present(self.doctor_name),
            doctor_email: present(self.doctor_email).map(|e| e.to_lowercase()),
            created_at: now,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSessionsQuery {
    pub doctor_id: Option<ProviderId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSessionsQuery {
    pub patient_id: Option<ProviderId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn request(value: serde_json::Value) -> CreateLiveSessionRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn builds_session_from_complete_request() {
        let now = Utc::now();
        let session = request(json!({
            "sessionName": "Jane Doe",
            "sessionUrl": "https://meet/x",
            "doctorId": "doc1",
            "doctorEmail": "Doc@Clinic.example"
        }))
        .into_session(now)
        .unwrap();

        assert_eq!(session.session_name, "Jane Doe");
        assert_eq!(session.session_url, "https://meet/x");
        assert_eq!(session.doctor_id.as_str(), "doc1");
        assert_eq!(session.doctor_email.as_deref(), Some("doc@clinic.example"));
        assert_eq!(session.created_at, now);
    }

    #[test]
    fn lists_every_missing_field() {
        let result = request(json!({ "sessionName": " " })).into_session(Utc::now());
        assert_matches!(
            result,
            Err(AppError::ValidationError(msg)) if msg == "Missing required fields: sessionName, sessionUrl, doctorId"
        );
    }

    #[test]
    fn rejects_relative_or_non_http_urls() {
        for url in ["/rooms/1", "ftp://meet/x", "https://", "meet.example.com/x"] {
            let result = request(json!({
                "sessionName": "Visit",
                "sessionUrl": url,
                "doctorId": "doc1"
            }))
            .into_session(Utc::now());
            assert_matches!(result, Err(AppError::ValidationError(_)), "{}", url);
        }
    }

    #[test]
    fn doctor_id_must_be_a_string() {
        let parsed = serde_json::from_value::<CreateLiveSessionRequest>(json!({
            "sessionName": "Visit",
            "sessionUrl": "https://meet/x",
            "doctorId": 42
        }));
        assert!(parsed.is_err());
    }
}
