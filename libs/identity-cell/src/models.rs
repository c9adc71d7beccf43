use std::sync::OnceLock;

use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use profile_cell::UserProfile;
use shared_models::error::AppError;
use shared_models::role::{Gender, Role};

const PHONE_PATTERN: &str = r"^\+?[0-9][0-9()\-.\s]{5,19}$";

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern is a valid regex"))
}

/// Raw onboarding submission as received on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCompletionRequest {
    pub phone: Option<String>,
    pub role: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileCompletion {
    pub phone: String,
    pub role: Role,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.parse::<DateTime<Utc>>().ok().map(|dt| dt.date_naive()))
}

impl ProfileCompletionRequest {
    pub fn validate(&self, today: NaiveDate) -> Result<ProfileCompletion, AppError> {
        let missing: Vec<&str> = [
            ("phone", present(&self.phone)),
            ("role", present(&self.role)),
            ("dateOfBirth", present(&self.date_of_birth)),
            ("gender", present(&self.gender)),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(AppError::validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        // All four are present past this point.
        let phone = present(&self.phone).unwrap_or_default();
        let role = present(&self.role).unwrap_or_default();
        let date_of_birth = present(&self.date_of_birth).unwrap_or_default();
        let gender = present(&self.gender).unwrap_or_default();

        if !phone_regex().is_match(phone) {
            return Err(AppError::validation("phone is not a valid phone number"));
        }

        let role: Role = role.parse().map_err(AppError::ValidationError)?;
        let gender: Gender = gender.parse().map_err(AppError::ValidationError)?;

        let date_of_birth = parse_date(date_of_birth)
            .ok_or_else(|| AppError::validation("dateOfBirth must be a date (YYYY-MM-DD)"))?;
        if date_of_birth > today {
            return Err(AppError::validation("dateOfBirth cannot be in the future"));
        }

        Ok(ProfileCompletion {
            phone: phone.to_string(),
            role,
            date_of_birth,
            gender,
        })
    }
}

/// Result of a sync operation: the persisted profile plus whether it was
/// created (201) or updated (200).
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub profile: UserProfile,
    pub created: bool,
}

impl SyncOutcome {
    pub fn status(&self) -> StatusCode {
        if self.created {
            StatusCode::CREATED
        } else {
            StatusCode::OK
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailAddress {
    pub id: Option<String>,
    pub email_address: String,
}

/// `data` of a `user.*` webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEventData {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub primary_email_address_id: Option<String>,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
}

impl IdentityEventData {
    /// Primary address, falling back to the first listed one.
    pub fn primary_email(&self) -> Option<String> {
        let primary = self.primary_email_address_id.as_deref().and_then(|wanted| {
            self.email_addresses
                .iter()
                .find(|e| e.id.as_deref() == Some(wanted))
        });

        primary
            .or_else(|| self.email_addresses.first())
            .map(|e| e.email_address.trim().to_lowercase())
            .filter(|e| !e.is_empty())
    }

    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum IdentityEvent {
    #[serde(rename = "user.updated")]
    UserUpdated(IdentityEventData),
    #[serde(rename = "user.deleted")]
    UserDeleted(DeletedIdentity),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeletedIdentity {
    pub id: Option<String>,
}

/// Envelope used to read the event type before committing to a variant.
#[derive(Debug, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub identity_id: String,
    pub profile: Option<UserProfile>,
    pub is_complete: bool,
    pub missing_fields: Vec<&'static str>,
}
