//! Admin moderation
//!
//! Runs against the elevated store. Every operation takes an [`AdminGrant`],
//! so the elevated key is never reachable without a verified admin role.

use std::sync::Arc;

use jb_common::{PageRequest, Pagination, UserRole};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Profile, ProfileStatusPatch, RecruiterSummary};
use crate::error::{PlatformError, Result};
use crate::repository::{
    ApplicationRepository, DataStore, JobRepository, JobSearch, ProfileRepository, ProfileSearch,
};
use crate::service::authorization::AdminGrant;
use crate::service::identity::{log_identity_failure, IdentityResolver};
use crate::service::jobs::{with_recruiters, JobList};

pub const DEFAULT_ADMIN_PAGE_SIZE: u32 = 20;

/// Repositories bound to the service-role store
pub struct AdminStore {
    profiles: ProfileRepository,
    jobs: JobRepository,
    applications: ApplicationRepository,
}

impl AdminStore {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            profiles: ProfileRepository::new(store.clone()),
            jobs: JobRepository::new(store.clone()),
            applications: ApplicationRepository::new(store),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserList {
    pub users: Vec<Profile>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_users: u64,
    pub job_seekers: u64,
    pub recruiters: u64,
    pub total_jobs: u64,
    pub active_jobs: u64,
    pub total_applications: u64,
}

pub struct AdminService {
    store: Option<AdminStore>,
    resolver: Arc<IdentityResolver>,
}

impl AdminService {
    /// `store` is `None` when no service-role key is configured
    pub fn new(store: Option<AdminStore>, resolver: Arc<IdentityResolver>) -> Self {
        Self { store, resolver }
    }

    fn store(&self) -> Result<&AdminStore> {
        self.store
            .as_ref()
            .ok_or_else(|| PlatformError::configuration("Admin operations require a service role key"))
    }

    pub async fn list_users(
        &self,
        _grant: &AdminGrant,
        filter: ProfileSearch,
        page: PageRequest,
    ) -> Result<UserList> {
        let found = self.store()?.profiles.search(&filter, page).await?;
        Ok(UserList {
            users: found.items,
            pagination: Pagination::new(page, found.total),
        })
    }

    pub async fn update_user_status(
        &self,
        grant: &AdminGrant,
        user_id: Uuid,
        patch: ProfileStatusPatch,
    ) -> Result<Profile> {
        if patch.is_empty() {
            return Err(PlatformError::validation("isActive or isVerified is required"));
        }

        let updated = self
            .store()?
            .profiles
            .update_status(user_id, &patch)
            .await?
            .ok_or_else(|| PlatformError::not_found("User", user_id))?;

        self.resolver.invalidate_user(user_id);
        info!(
            user_id = %user_id,
            admin = %grant.actor(),
            is_active = ?patch.is_active,
            is_verified = ?patch.is_verified,
            "User status updated"
        );
        Ok(updated)
    }

    /// Removes the profile (cascading to owned rows), then the identity
    /// record. An identity failure is logged, not reported.
    pub async fn delete_user(&self, grant: &AdminGrant, user_id: Uuid) -> Result<()> {
        if !self.store()?.profiles.delete(user_id).await? {
            return Err(PlatformError::not_found("User", user_id));
        }
        self.resolver.invalidate_user(user_id);

        if let Err(e) = self.resolver.provider().delete_user(user_id).await {
            log_identity_failure("delete_user", &e);
        }
        info!(user_id = %user_id, admin = %grant.actor(), "User deleted");
        Ok(())
    }

    /// All listings regardless of status, with recruiter contact details
    pub async fn list_jobs(
        &self,
        _grant: &AdminGrant,
        is_active: Option<bool>,
        page: PageRequest,
    ) -> Result<JobList> {
        let store = self.store()?;
        let search = JobSearch {
            is_active,
            ..Default::default()
        };
        let found = store.jobs.search(&search, page).await?;
        let jobs = with_recruiters(&store.profiles, found.items, RecruiterSummary::with_email).await?;
        Ok(JobList {
            jobs,
            pagination: Pagination::new(page, found.total),
        })
    }

    pub async fn stats(&self, _grant: &AdminGrant) -> Result<PlatformStats> {
        let store = self.store()?;
        let (total_users, job_seekers, recruiters, total_jobs, active_jobs, total_applications) = futures::try_join!(
            store.profiles.count(None),
            store.profiles.count(Some(UserRole::JobSeeker)),
            store.profiles.count(Some(UserRole::Recruiter)),
            store.jobs.count(None),
            store.jobs.count(Some(true)),
            store.applications.count(),
        )?;

        Ok(PlatformStats {
            total_users,
            job_seekers,
            recruiters,
            total_jobs,
            active_jobs,
            total_applications,
        })
    }
}
