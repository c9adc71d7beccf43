use chrono::Utc;
use tracing::{debug, info, warn};

use profile_cell::{NewUserProfile, ProfilePatch, ProfileService, UserProfile};
use shared_database::StoreHandle;
use shared_models::auth::Identity;
use shared_models::error::AppError;

use crate::models::{
    DeletedIdentity, IdentityEvent, IdentityEventData, ProfileCompletionRequest, SyncOutcome,
};

/// A profile matched by email belongs to the caller from now on, so lookups
/// by identity id find it.
fn relink(profile: &UserProfile, identity: &Identity) -> Option<String> {
    if profile.external_id == identity.id {
        return None;
    }
    info!("Relinking profile {} from {} to {}", profile.id, profile.external_id, identity.id);
    Some(identity.id.clone())
}

/// Keeps local profiles consistent with the identity provider.
///
/// Every operation writes through immediately; there is no batching and no
/// retry. Concurrent first-time writes for one identity are arbitrated by
/// the store's unique constraint and surface as `AppError::Conflict`.
pub struct IdentitySyncService {
    profiles: ProfileService,
}

impl IdentitySyncService {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            profiles: ProfileService::new(store),
        }
    }

    /// Creates a bare profile for a new identity, or stamps the last login
    /// of an existing one.
    pub async fn on_first_authentication(&self, identity: &Identity) -> Result<SyncOutcome, AppError> {
        let now = Utc::now();

        if let Some(existing) = self
            .profiles
            .find_for_identity(&identity.id, identity.email.as_deref())
            .await?
        {
            debug!("Identity {} already has profile {}", identity.id, existing.id);
            let patch = ProfilePatch {
                external_id: relink(&existing, identity),
                last_login_at: Some(now),
                ..ProfilePatch::default()
            };
            let profile = self.profiles.update(&existing, patch).await?;
            return Ok(SyncOutcome { profile, created: false });
        }

        // Role stays unset until onboarding is completed.
        let new_profile = NewUserProfile {
            last_login_at: Some(now),
            ..NewUserProfile::from_identity(identity)
        };

        let profile = self.profiles.insert(new_profile).await?;
        info!("Created profile {} for identity {}", profile.id, identity.id);
        Ok(SyncOutcome { profile, created: true })
    }

    pub async fn on_profile_completion_submitted(
        &self,
        identity: &Identity,
        request: &ProfileCompletionRequest,
    ) -> Result<SyncOutcome, AppError> {
        let completion = request.validate(Utc::now().date_naive())?;

        let existing = self
            .profiles
            .find_for_identity(&identity.id, identity.email.as_deref())
            .await?;

        match existing {
            Some(profile) => {
                debug!("Completing existing profile {} for {}", profile.id, identity.id);
                let patch = ProfilePatch {
                    external_id: relink(&profile, identity),
                    phone: Some(completion.phone),
                    role: Some(completion.role),
                    date_of_birth: Some(completion.date_of_birth),
                    gender: Some(completion.gender),
                    ..ProfilePatch::default()
                };
                let profile = self.profiles.update(&profile, patch).await?;
                Ok(SyncOutcome { profile, created: false })
            }
            None => {
                let new_profile = NewUserProfile {
                    phone: Some(completion.phone),
                    role: Some(completion.role),
                    date_of_birth: Some(completion.date_of_birth),
                    gender: Some(completion.gender),
                    last_login_at: Some(Utc::now()),
                    ..NewUserProfile::from_identity(identity)
                };
                let profile = self.profiles.insert(new_profile).await?;
                info!("Created completed profile {} for identity {}", profile.id, identity.id);
                Ok(SyncOutcome { profile, created: true })
            }
        }
    }

    /// Mirrors name, email and photo changes. Unknown identities are ignored.
    pub async fn on_identity_updated_event(
        &self,
        data: &IdentityEventData,
    ) -> Result<Option<UserProfile>, AppError> {
        let existing = match self.profiles.get_profile(&data.id).await? {
            Some(profile) => profile,
            None => {
                debug!("No profile for updated identity {}, ignoring", data.id);
                return Ok(None);
            }
        };

        let patch = ProfilePatch {
            email: data.primary_email(),
            display_name: data.display_name(),
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            photo_url: data.image_url.clone(),
            ..ProfilePatch::default()
        };

        if patch.is_empty() {
            return Ok(Some(existing));
        }

        match self.profiles.update(&existing, patch.clone()).await {
            Ok(profile) => Ok(Some(profile)),
            // Redelivery cannot resolve an email clash, so keep the old address.
            Err(AppError::Conflict(msg)) => {
                warn!("Keeping email of profile {} for {}: {}", existing.id, data.id, msg);
                let patch = ProfilePatch { email: None, ..patch };
                if patch.is_empty() {
                    return Ok(Some(existing));
                }
                self.profiles.update(&existing, patch).await.map(Some)
            }
            Err(e) => Err(e),
        }
    }

    /// Removes the profile for a deleted identity. Unknown identities are ignored.
    pub async fn on_identity_deleted_event(&self, data: &DeletedIdentity) -> Result<bool, AppError> {
        let identity_id = match data.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => {
                debug!("Delete event without identity id, ignoring");
                return Ok(false);
            }
        };

        let removed = self.profiles.delete_for_identity(identity_id).await?;
        if removed {
            info!("Deleted profile for identity {}", identity_id);
        }
        Ok(removed)
    }

    /// Applies a verified webhook event; returns whether anything changed.
    pub async fn handle_event(&self, event: &IdentityEvent) -> Result<bool, AppError> {
        match event {
            IdentityEvent::UserUpdated(data) => {
                Ok(self.on_identity_updated_event(data).await?.is_some())
            }
            IdentityEvent::UserDeleted(data) => self.on_identity_deleted_event(data).await,
        }
    }
}
