//! Saved Job (bookmark) Entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::JobSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SavedJob {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSavedJob {
    pub job_id: Uuid,
    pub user_id: Uuid,
}

/// A bookmark with its listing embedded under `jobs`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SavedJobWithJob {
    #[serde(flatten)]
    pub saved_job: SavedJob,
    pub jobs: Option<JobSummary>,
}
