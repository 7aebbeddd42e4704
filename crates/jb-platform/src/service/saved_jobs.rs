//! Saved-Job Registry

use std::collections::HashMap;
use std::sync::Arc;

use jb_common::{PageRequest, Pagination, UserRole};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{JobSummary, NewSavedJob, SavedJob, SavedJobWithJob};
use crate::error::{PlatformError, Result};
use crate::repository::{JobRepository, SavedJobRepository};
use crate::service::authorization::{checks, AuthContext};

pub const ALREADY_SAVED: &str = "Job already saved";

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedJobList {
    pub saved_jobs: Vec<SavedJobWithJob>,
    pub pagination: Pagination,
}

pub struct SavedJobService {
    saved_jobs: Arc<SavedJobRepository>,
    jobs: Arc<JobRepository>,
}

impl SavedJobService {
    pub fn new(saved_jobs: Arc<SavedJobRepository>, jobs: Arc<JobRepository>) -> Self {
        Self { saved_jobs, jobs }
    }

    pub async fn save(&self, actor: &AuthContext, job_id: Uuid) -> Result<SavedJob> {
        checks::require_role(actor, &[UserRole::JobSeeker])?;
        if self.jobs.find_by_id(job_id).await?.is_none() {
            return Err(PlatformError::not_found("Job", job_id));
        }

        let saved = self
            .saved_jobs
            .insert(&NewSavedJob {
                job_id,
                user_id: actor.user_id,
            })
            .await
            .map_err(|e| PlatformError::from_store_with_conflict(e, ALREADY_SAVED))?;

        debug!(job_id = %job_id, user_id = %actor.user_id, "Job saved");
        Ok(saved)
    }

    pub async fn list(&self, actor: &AuthContext, page: PageRequest) -> Result<SavedJobList> {
        checks::require_role(actor, &[UserRole::JobSeeker])?;
        let found = self.saved_jobs.find_by_user(actor.user_id, page).await?;

        let mut job_ids: Vec<Uuid> = found.items.iter().map(|s| s.job_id).collect();
        job_ids.sort_unstable();
        job_ids.dedup();
        let jobs: HashMap<Uuid, JobSummary> = self
            .jobs
            .find_by_ids(&job_ids)
            .await?
            .iter()
            .map(|job| (job.id, JobSummary::from(job)))
            .collect();

        let saved_jobs = found
            .items
            .into_iter()
            .map(|saved_job| SavedJobWithJob {
                jobs: jobs.get(&saved_job.job_id).cloned(),
                saved_job,
            })
            .collect();

        Ok(SavedJobList {
            saved_jobs,
            pagination: Pagination::new(page, found.total),
        })
    }

    /// Removing a bookmark that does not exist still succeeds
    pub async fn unsave(&self, actor: &AuthContext, job_id: Uuid) -> Result<()> {
        checks::require_role(actor, &[UserRole::JobSeeker])?;

        let removed = self.saved_jobs.delete(job_id, actor.user_id).await?;
        debug!(job_id = %job_id, user_id = %actor.user_id, removed, "Job unsaved");
        Ok(())
    }
}
