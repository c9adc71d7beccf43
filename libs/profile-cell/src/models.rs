use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::auth::Identity;
use shared_models::role::{Gender, Role};

/// Canonical user entity, keyed by the identity provider id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub external_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    /// `None` until the user completes onboarding.
    pub role: Option<Role>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub photo_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl UserProfile {
    /// Complete once phone, role, date of birth and gender are all set.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.phone.as_deref().map_or(true, |p| p.trim().is_empty()) {
            missing.push("phone");
        }
        if self.role.is_none() {
            missing.push("role");
        }
        if self.date_of_birth.is_none() {
            missing.push("dateOfBirth");
        }
        if self.gender.is_none() {
            missing.push("gender");
        }
        missing
    }

    /// Role of a completed profile; incomplete profiles grant nothing.
    pub fn effective_role(&self) -> Option<Role> {
        if self.is_complete() {
            self.role
        } else {
            None
        }
    }
}

/// Fields for a profile about to be inserted.
#[derive(Debug, Clone, Default)]
pub struct NewUserProfile {
    pub external_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl NewUserProfile {
    /// Minimal profile populated from what the identity provider asserts.
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            external_id: identity.id.clone(),
            email: identity.email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            display_name: identity.display_name(),
            photo_url: identity.photo_url.clone(),
            ..Self::default()
        }
    }

    pub fn into_profile(self, now: DateTime<Utc>) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            external_id: self.external_id,
            email: self.email,
            display_name: self.display_name,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            role: self.role,
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            photo_url: self.photo_url,
            is_active: true,
            last_login_at: self.last_login_at,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    /// Relinks the profile to a new identity id (same email, new account).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersByRoleQuery {
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bare_profile() -> UserProfile {
        NewUserProfile {
            external_id: "user_1".to_string(),
            ..NewUserProfile::default()
        }
        .into_profile(Utc::now())
    }

    #[test]
    fn new_profile_is_incomplete_and_active() {
        let profile = bare_profile();
        assert!(profile.is_active);
        assert!(!profile.is_complete());
        assert_eq!(profile.missing_fields(), vec!["phone", "role", "dateOfBirth", "gender"]);
        assert_eq!(profile.effective_role(), None);
    }

    #[test]
    fn profile_with_all_fields_is_complete() {
        let mut profile = bare_profile();
        profile.phone = Some("+15550100".to_string());
        profile.role = Some(Role::Doctor);
        profile.date_of_birth = NaiveDate::from_ymd_opt(1980, 5, 17);
        profile.gender = Some(Gender::Female);
        assert!(profile.is_complete());
        assert_eq!(profile.effective_role(), Some(Role::Doctor));

        profile.phone = Some("   ".to_string());
        assert!(!profile.is_complete());
    }

    #[test]
    fn serializes_camel_case() {
        let value = serde_json::to_value(bare_profile()).unwrap();
        assert_eq!(value["externalId"], "user_1");
        assert_eq!(value["role"], json!(null));
        assert_eq!(value["isActive"], true);
    }

    #[test]
    fn patch_skips_absent_fields() {
        let patch = ProfilePatch {
            phone: Some("555".to_string()),
            role: Some(Role::LabReporter),
            ..ProfilePatch::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({ "phone": "555", "role": "lab_reporter" })
        );
        assert!(ProfilePatch::default().is_empty());
    }
}
