//! Application Workflow
//!
//! Apply, list, status updates and withdrawal. At most one application
//! exists per (job, applicant); the store's unique key is the final word,
//! the pre-check only gives the common case a friendlier path.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use jb_common::{ApplicationStatus, PageRequest, Pagination};
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    ApplicantSummary, Application, ApplicationWithApplicant, ApplicationWithJob, JobSummary,
    NewApplication, NewNotification, StatusChange, StatusTransitionPolicy,
};
use crate::error::{PlatformError, Result};
use crate::repository::{ApplicationRepository, JobRepository, ProfileRepository};
use crate::service::authorization::{authorize, checks, Action, AuthContext};
use crate::service::notifications::NotificationService;

pub const ALREADY_APPLIED: &str = "You have already applied to this job";

/// Input for a new application
#[derive(Debug, Clone)]
pub struct ApplyRequest {
    pub job_id: Uuid,
    pub resume_url: String,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MyApplicationList {
    pub applications: Vec<ApplicationWithJob>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobApplicationList {
    pub applications: Vec<ApplicationWithApplicant>,
    pub pagination: Pagination,
}

pub struct ApplicationService {
    applications: Arc<ApplicationRepository>,
    jobs: Arc<JobRepository>,
    profiles: Arc<ProfileRepository>,
    notifications: Arc<NotificationService>,
    transitions: StatusTransitionPolicy,
}

impl ApplicationService {
    pub fn new(
        applications: Arc<ApplicationRepository>,
        jobs: Arc<JobRepository>,
        profiles: Arc<ProfileRepository>,
        notifications: Arc<NotificationService>,
        transitions: StatusTransitionPolicy,
    ) -> Self {
        Self {
            applications,
            jobs,
            profiles,
            notifications,
            transitions,
        }
    }

    pub async fn apply(&self, actor: &AuthContext, request: ApplyRequest) -> Result<Application> {
        checks::require_role(actor, &[jb_common::UserRole::JobSeeker])?;
        if request.resume_url.trim().is_empty() {
            return Err(PlatformError::validation("resumeUrl is required"));
        }

        let job = self
            .jobs
            .find_by_id(request.job_id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Job", request.job_id))?;
        authorize(actor, Action::Apply { job_active: job.is_active })?;

        if self.applications.exists_for(job.id, actor.user_id).await? {
            return Err(PlatformError::conflict(ALREADY_APPLIED));
        }

        let new_application = NewApplication::new(job.id, actor.user_id, request.resume_url)
            .with_cover_letter(request.cover_letter);
        let application = self
            .applications
            .insert(&new_application)
            .await
            .map_err(|e| PlatformError::from_store_with_conflict(e, ALREADY_APPLIED))?;

        info!(
            application_id = %application.id,
            job_id = %job.id,
            applicant_id = %actor.user_id,
            "Application submitted"
        );

        self.notifications
            .notify_best_effort(NewNotification::new_application(job.recruiter_id, &job.title))
            .await;

        Ok(application)
    }

    /// The caller's own applications, each with its listing
    pub async fn list_mine(
        &self,
        actor: &AuthContext,
        status: Option<ApplicationStatus>,
        page: PageRequest,
    ) -> Result<MyApplicationList> {
        checks::require_role(actor, &[jb_common::UserRole::JobSeeker])?;
        let found = self.applications.find_by_applicant(actor.user_id, status, page).await?;

        let job_ids: Vec<Uuid> = found.items.iter().map(|a| a.job_id).collect();
        let jobs: HashMap<Uuid, JobSummary> = self
            .jobs
            .find_by_ids(&dedup(job_ids))
            .await?
            .iter()
            .map(|job| (job.id, JobSummary::from(job)))
            .collect();

        let applications = found
            .items
            .into_iter()
            .map(|application| ApplicationWithJob {
                jobs: jobs.get(&application.job_id).cloned(),
                application,
            })
            .collect();

        Ok(MyApplicationList {
            applications,
            pagination: Pagination::new(page, found.total),
        })
    }

    /// Applications for one listing, visible to its recruiter and admins
    pub async fn list_for_job(
        &self,
        actor: &AuthContext,
        job_id: Uuid,
        status: Option<ApplicationStatus>,
        page: PageRequest,
    ) -> Result<JobApplicationList> {
        let job = self
            .jobs
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Job", job_id))?;
        authorize(
            actor,
            Action::ListJobApplications {
                recruiter_id: job.recruiter_id,
            },
        )?;

        let found = self.applications.find_by_job(job_id, status, page).await?;

        let applicant_ids: Vec<Uuid> = found.items.iter().map(|a| a.applicant_id).collect();
        let applicants: HashMap<Uuid, ApplicantSummary> = self
            .profiles
            .find_by_ids(&dedup(applicant_ids))
            .await?
            .iter()
            .map(|p| (p.id, ApplicantSummary::from(p)))
            .collect();

        let applications = found
            .items
            .into_iter()
            .map(|application| ApplicationWithApplicant {
                profiles: applicants.get(&application.applicant_id).cloned(),
                application,
            })
            .collect();

        Ok(JobApplicationList {
            applications,
            pagination: Pagination::new(page, found.total),
        })
    }

    pub async fn update_status(
        &self,
        actor: &AuthContext,
        id: Uuid,
        status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<Application> {
        let current = self.find(id).await?;
        let job = self
            .jobs
            .find_by_id(current.job_id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Job", current.job_id))?;
        authorize(
            actor,
            Action::UpdateApplicationStatus {
                recruiter_id: job.recruiter_id,
            },
        )?;

        if !self.transitions.permits(current.status, status) {
            return Err(PlatformError::validation(format!(
                "Cannot change application status from {} to {}",
                current.status, status
            )));
        }

        let change = StatusChange {
            status,
            notes: notes.filter(|n| !n.trim().is_empty()),
            updated_at: Utc::now(),
        };
        let updated = self
            .applications
            .update_status(id, &change)
            .await?
            .ok_or_else(|| PlatformError::not_found("Application", id))?;

        info!(
            application_id = %id,
            from = %current.status,
            to = %status,
            actor = %actor.user_id,
            "Application status updated"
        );

        // Notes-only edits keep the status and send nothing
        if current.status != status {
            self.notifications
                .notify_best_effort(NewNotification::application_update(
                    updated.applicant_id,
                    &job.title,
                    status,
                ))
                .await;
        }

        Ok(updated)
    }

    pub async fn withdraw(&self, actor: &AuthContext, id: Uuid) -> Result<()> {
        let current = self.find(id).await?;
        authorize(
            actor,
            Action::WithdrawApplication {
                applicant_id: current.applicant_id,
            },
        )?;

        if !self.applications.delete(id).await? {
            debug!(application_id = %id, "Application already removed");
        }
        info!(application_id = %id, job_id = %current.job_id, "Application withdrawn");
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Application> {
        self.applications
            .find_by_id(id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Application", id))
    }
}

fn dedup(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort_unstable();
    ids.dedup();
    ids
}
