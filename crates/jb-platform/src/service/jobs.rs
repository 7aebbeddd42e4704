//! Job Listing Workflow

use std::collections::HashMap;
use std::sync::Arc;

use jb_common::{PageRequest, Pagination};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Job, JobDraft, JobPatch, JobWithRecruiter, NewJob, Profile, RecruiterSummary};
use crate::error::{PlatformError, Result};
use crate::repository::{JobRepository, JobSearch, ProfileRepository};
use crate::service::authorization::{authorize, Action, AuthContext};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobList {
    pub jobs: Vec<JobWithRecruiter>,
    pub pagination: Pagination,
}

pub struct JobService {
    jobs: Arc<JobRepository>,
    profiles: Arc<ProfileRepository>,
}

impl JobService {
    pub fn new(jobs: Arc<JobRepository>, profiles: Arc<ProfileRepository>) -> Self {
        Self { jobs, profiles }
    }

    pub async fn create(&self, actor: &AuthContext, draft: JobDraft) -> Result<Job> {
        authorize(actor, Action::CreateJob)?;
        draft.validate().map_err(PlatformError::validation)?;

        let job = self
            .jobs
            .insert(&NewJob {
                recruiter_id: actor.user_id,
                draft,
            })
            .await?;

        info!(job_id = %job.id, recruiter_id = %job.recruiter_id, "Job created");
        Ok(job)
    }

    /// Public listing: active jobs only, newest first, with the recruiter
    pub async fn list(&self, filters: JobSearch, page: PageRequest) -> Result<JobList> {
        let search = JobSearch {
            is_active: Some(true),
            recruiter_id: None,
            ..filters
        };
        let found = self.jobs.search(&search, page).await?;
        let jobs = self.with_recruiters(found.items, RecruiterSummary::public).await?;
        Ok(JobList {
            jobs,
            pagination: Pagination::new(page, found.total),
        })
    }

    /// Every listing the caller owns, active or not
    pub async fn list_own(&self, actor: &AuthContext, page: PageRequest) -> Result<JobList> {
        authorize(actor, Action::CreateJob)?;
        let search = JobSearch {
            recruiter_id: Some(actor.user_id),
            ..Default::default()
        };
        let found = self.jobs.search(&search, page).await?;
        let jobs = found
            .items
            .into_iter()
            .map(|job| JobWithRecruiter { job, profiles: None })
            .collect();
        Ok(JobList {
            jobs,
            pagination: Pagination::new(page, found.total),
        })
    }

    /// Any authenticated actor may read a listing by id, active or not;
    /// only the public listing filters on `is_active`
    pub async fn get(&self, id: Uuid) -> Result<JobWithRecruiter> {
        let job = self.find(id).await?;

        let recruiter = self.profiles.find_by_id(job.recruiter_id).await?;
        Ok(JobWithRecruiter {
            profiles: recruiter.as_ref().map(RecruiterSummary::public),
            job,
        })
    }

    pub async fn update(&self, actor: &AuthContext, id: Uuid, patch: JobPatch) -> Result<Job> {
        let current = self.find(id).await?;
        authorize(
            actor,
            Action::UpdateJob {
                recruiter_id: current.recruiter_id,
            },
        )?;
        patch.validate_against(&current).map_err(PlatformError::validation)?;

        let updated = self
            .jobs
            .update(id, &patch)
            .await?
            .ok_or_else(|| PlatformError::not_found("Job", id))?;

        info!(job_id = %id, actor = %actor.user_id, "Job updated");
        Ok(updated)
    }

    pub async fn delete(&self, actor: &AuthContext, id: Uuid) -> Result<()> {
        let current = self.find(id).await?;
        authorize(
            actor,
            Action::DeleteJob {
                recruiter_id: current.recruiter_id,
            },
        )?;

        if !self.jobs.delete(id).await? {
            return Err(PlatformError::not_found("Job", id));
        }
        info!(job_id = %id, actor = %actor.user_id, "Job deleted");
        Ok(())
    }

    pub(crate) async fn find(&self, id: Uuid) -> Result<Job> {
        self.jobs
            .find_by_id(id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Job", id))
    }

    pub(crate) async fn with_recruiters(
        &self,
        jobs: Vec<Job>,
        summarize: fn(&Profile) -> RecruiterSummary,
    ) -> Result<Vec<JobWithRecruiter>> {
        with_recruiters(&self.profiles, jobs, summarize).await
    }
}

/// Embed the recruiter summary into each listing
pub(crate) async fn with_recruiters(
    profiles: &ProfileRepository,
    jobs: Vec<Job>,
    summarize: fn(&Profile) -> RecruiterSummary,
) -> Result<Vec<JobWithRecruiter>> {
    let mut ids: Vec<Uuid> = jobs.iter().map(|j| j.recruiter_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let recruiters: HashMap<Uuid, Profile> = profiles
        .find_by_ids(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    Ok(jobs
        .into_iter()
        .map(|job| JobWithRecruiter {
            profiles: recruiters.get(&job.recruiter_id).map(summarize),
            job,
        })
        .collect())
}
