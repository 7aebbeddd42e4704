//! Profile read/update and resume registration

use std::sync::Arc;

use jb_common::UserRole;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Profile, ProfilePatch};
use crate::error::{PlatformError, Result};
use crate::repository::ProfileRepository;
use crate::service::authorization::{authorize, Action, AuthContext};

pub struct ProfileService {
    profiles: Arc<ProfileRepository>,
}

impl ProfileService {
    pub fn new(profiles: Arc<ProfileRepository>) -> Self {
        Self { profiles }
    }

    pub async fn get(&self, id: Uuid) -> Result<Profile> {
        self.profiles
            .find_by_id(id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Profile", id))
    }

    /// Owner-only partial update. Company fields belong to recruiters.
    pub async fn update(&self, actor: &AuthContext, id: Uuid, patch: ProfilePatch) -> Result<Profile> {
        authorize(actor, Action::UpdateProfile { profile_id: id })?;
        if patch.touches_company_fields() && !actor.has_any_role(&[UserRole::Recruiter, UserRole::Admin]) {
            return Err(PlatformError::validation(
                "Company details can only be set on recruiter profiles",
            ));
        }
        patch.validate().map_err(PlatformError::validation)?;

        if patch.is_empty() {
            return self.get(id).await;
        }

        let updated = self
            .profiles
            .update(id, &patch)
            .await?
            .ok_or_else(|| PlatformError::not_found("Profile", id))?;
        info!(profile_id = %id, "Profile updated");
        Ok(updated)
    }

    /// Store the durable URL of an already-uploaded resume
    pub async fn set_resume(&self, actor: &AuthContext, resume_url: &str) -> Result<Profile> {
        let patch = ProfilePatch::with_resume_url(resume_url.trim());
        patch.validate().map_err(|_| PlatformError::validation("resumeUrl is required"))?;

        self.profiles
            .update(actor.user_id, &patch)
            .await?
            .ok_or_else(|| PlatformError::not_found("Profile", actor.user_id))
    }
}
