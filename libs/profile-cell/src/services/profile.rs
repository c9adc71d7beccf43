use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;

use shared_database::{Collection, Filter, StoreHandle};
use shared_models::error::AppError;
use shared_models::role::Role;

use crate::models::{NewUserProfile, ProfilePatch, UserProfile};

/// Authoritative "who is this caller and what can they do" lookups.
///
/// Reads go straight to the store on every call, so they always reflect the
/// latest committed write. A missing profile is `Ok(None)`, not an error.
#[derive(Clone)]
pub struct ProfileService {
    store: StoreHandle,
}

impl ProfileService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    fn parse(value: Value) -> Result<UserProfile, AppError> {
        serde_json::from_value(value)
            .map_err(|e| AppError::Database(format!("Malformed user profile: {}", e)))
    }

    async fn find_one(&self, filter: Filter) -> Result<Option<UserProfile>, AppError> {
        self.store
            .find_one(Collection::Users, &filter)
            .await?
            .map(Self::parse)
            .transpose()
    }

    pub async fn get_profile(&self, identity_id: &str) -> Result<Option<UserProfile>, AppError> {
        debug!("Fetching profile for identity: {}", identity_id);
        self.find_one(Filter::new().eq("externalId", identity_id)).await
    }

    pub async fn get_role(&self, identity_id: &str) -> Result<Option<Role>, AppError> {
        Ok(self.get_profile(identity_id).await?.and_then(|p| p.role))
    }

    pub async fn has_role(&self, identity_id: &str, role: Role) -> Result<bool, AppError> {
        Ok(self.get_role(identity_id).await? == Some(role))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, AppError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Ok(None);
        }
        self.find_one(Filter::new().eq("email", email)).await
    }

    /// Matches by identity id first, then by email.
    pub async fn find_for_identity(
        &self,
        identity_id: &str,
        email: Option<&str>,
    ) -> Result<Option<UserProfile>, AppError> {
        if let Some(profile) = self.get_profile(identity_id).await? {
            return Ok(Some(profile));
        }

        match email {
            Some(email) => self.find_by_email(email).await,
            None => Ok(None),
        }
    }

    /// Active profiles holding `role`, ordered by display name.
    pub async fn list_by_role(&self, role: Role) -> Result<Vec<UserProfile>, AppError> {
        debug!("Listing profiles with role: {}", role);

        let filter = Filter::new()
            .eq("role", role.as_str())
            .eq("isActive", true);

        let mut profiles = self
            .store
            .find(Collection::Users, &filter)
            .await?
            .into_iter()
            .map(Self::parse)
            .collect::<Result<Vec<_>, _>>()?;

        profiles.sort_by(|a, b| {
            let key = |p: &UserProfile| p.display_name.clone().unwrap_or_default().to_lowercase();
            key(a).cmp(&key(b))
        });

        Ok(profiles)
    }

    pub async fn insert(&self, new_profile: NewUserProfile) -> Result<UserProfile, AppError> {
        let profile = new_profile.into_profile(Utc::now());
        debug!("Creating profile for identity: {}", profile.external_id);

        let document = serde_json::to_value(&profile)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let stored = self.store.insert(Collection::Users, document).await?;
        Self::parse(stored)
    }

    /// Patches the profile with the given row id and returns the new state.
    pub async fn update(&self, profile: &UserProfile, patch: ProfilePatch) -> Result<UserProfile, AppError> {
        debug!("Updating profile: {}", profile.id);

        let mut document = serde_json::to_value(&patch)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        document["updatedAt"] = json!(Utc::now());

        let filter = Filter::new().eq("id", profile.id.to_string());
        let mut updated = self.store.update(Collection::Users, &filter, document).await?;

        if updated.is_empty() {
            return Err(AppError::NotFound(format!("User profile {} not found", profile.id)));
        }

        Self::parse(updated.swap_remove(0))
    }

    /// Deletes the profile for an identity; returns whether one existed.
    pub async fn delete_for_identity(&self, identity_id: &str) -> Result<bool, AppError> {
        let removed = self
            .store
            .delete(Collection::Users, &Filter::new().eq("externalId", identity_id))
            .await?;
        Ok(removed > 0)
    }
}
