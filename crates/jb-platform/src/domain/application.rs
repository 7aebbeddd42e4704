//! Job Application Entity

use chrono::{DateTime, Utc};
use jb_common::ApplicationStatus;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ApplicantSummary, JobSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    pub resume_url: String,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub resume_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
}

impl NewApplication {
    pub fn new(job_id: Uuid, applicant_id: Uuid, resume_url: impl Into<String>) -> Self {
        Self {
            job_id,
            applicant_id,
            resume_url: resume_url.into(),
            cover_letter: None,
            status: ApplicationStatus::Pending,
        }
    }

    pub fn with_cover_letter(mut self, cover_letter: Option<String>) -> Self {
        self.cover_letter = cover_letter.filter(|c| !c.trim().is_empty());
        self
    }
}

/// Columns written by a status update
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// How strictly status updates are checked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusTransitionPolicy {
    /// Any known status may be set
    #[default]
    Unrestricted,
    /// Only moves along the documented lifecycle graph
    Lifecycle,
}

impl StatusTransitionPolicy {
    pub fn from_enforce_flag(enforce: bool) -> Self {
        if enforce {
            Self::Lifecycle
        } else {
            Self::Unrestricted
        }
    }

    pub fn permits(&self, from: ApplicationStatus, to: ApplicationStatus) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Lifecycle => from.can_advance_to(to),
        }
    }
}

/// An application with its listing embedded under `jobs`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationWithJob {
    #[serde(flatten)]
    pub application: Application,
    pub jobs: Option<JobSummary>,
}

/// An application with its applicant embedded under `profiles`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationWithApplicant {
    #[serde(flatten)]
    pub application: Application,
    pub profiles: Option<ApplicantSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn test_unrestricted_policy_allows_any_status() {
        let policy = StatusTransitionPolicy::from_enforce_flag(false);
        assert!(policy.permits(Accepted, Pending));
        assert!(policy.permits(Rejected, Reviewing));
    }

    #[test]
    fn test_lifecycle_policy() {
        let policy = StatusTransitionPolicy::from_enforce_flag(true);
        assert!(policy.permits(Pending, Reviewing));
        assert!(policy.permits(Shortlisted, Accepted));
        assert!(policy.permits(Accepted, Accepted));
        assert!(!policy.permits(Accepted, Pending));
        assert!(!policy.permits(Shortlisted, Reviewing));
    }

    #[test]
    fn test_blank_cover_letter_is_dropped() {
        let app = NewApplication::new(Uuid::new_v4(), Uuid::new_v4(), "https://cdn/cv.pdf")
            .with_cover_letter(Some("   ".to_string()));
        assert!(app.cover_letter.is_none());

        let row = serde_json::to_value(&app).unwrap();
        assert_eq!(row["status"], "pending");
        assert!(row.get("cover_letter").is_none());
    }
}
