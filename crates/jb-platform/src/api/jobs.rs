//! Jobs API

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use jb_common::{ExperienceLevel, JobType, PageRequest, DEFAULT_PAGE_SIZE};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::api::common::{ApiResult, MessageResponse, PaginationParams, ValidJson, ValidPath, ValidQuery};
use crate::api::middleware::Authenticated;
use crate::domain::{Job, JobDraft, JobPatch, JobWithRecruiter};
use crate::error::PlatformError;
use crate::repository::JobSearch;
use crate::service::{JobList, JobService};

/// Listing filters
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct JobsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Substring of title, description or company
    pub search: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub experience_level: Option<ExperienceLevel>,
    /// Comma-separated; matches any
    pub skills: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl JobsQuery {
    fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    fn into_search(self) -> JobSearch {
        JobSearch {
            search: self.search,
            location: self.location,
            job_type: self.job_type,
            experience_level: self.experience_level,
            skills: self.skills.as_deref().map(JobSearch::parse_skills).unwrap_or_default(),
            ..JobSearch::active()
        }
    }
}

#[derive(Clone)]
pub struct JobsState {
    pub jobs: Arc<JobService>,
}

/// Search active listings
#[utoipa::path(
    get,
    path = "/api/jobs",
    tag = "jobs",
    params(JobsQuery),
    responses(
        (status = 200, description = "Active listings, newest first", body = JobList),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_jobs(
    State(state): State<JobsState>,
    _auth: Authenticated,
    ValidQuery(query): ValidQuery<JobsQuery>,
) -> ApiResult<JobList> {
    let page = query.page_request();
    Ok(Json(state.jobs.list(query.into_search(), page).await?))
}

/// Listings owned by the caller, active or not
#[utoipa::path(
    get,
    path = "/api/jobs/my-jobs",
    tag = "jobs",
    params(PaginationParams),
    responses(
        (status = 200, description = "Own listings", body = JobList),
        (status = 403, description = "Not a recruiter")
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_jobs(
    State(state): State<JobsState>,
    Authenticated(auth): Authenticated,
    ValidQuery(params): ValidQuery<PaginationParams>,
) -> ApiResult<JobList> {
    Ok(Json(state.jobs.list_own(&auth, params.to_page_request()).await?))
}

/// Listing detail with the recruiter
#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    tag = "jobs",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Listing", body = JobWithRecruiter),
        (status = 404, description = "Job not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_job(
    State(state): State<JobsState>,
    Authenticated(_auth): Authenticated,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<JobWithRecruiter> {
    Ok(Json(state.jobs.get(id).await?))
}

/// Create a listing owned by the caller
#[utoipa::path(
    post,
    path = "/api/jobs",
    tag = "jobs",
    request_body = JobDraft,
    responses(
        (status = 201, description = "Created", body = Job),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not a recruiter")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_job(
    State(state): State<JobsState>,
    Authenticated(auth): Authenticated,
    ValidJson(draft): ValidJson<JobDraft>,
) -> Result<(StatusCode, Json<Job>), PlatformError> {
    let job = state.jobs.create(&auth, draft).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// Partial update by the owner or an admin
#[utoipa::path(
    put,
    path = "/api/jobs/{id}",
    tag = "jobs",
    params(("id" = Uuid, Path, description = "Job id")),
    request_body = JobPatch,
    responses(
        (status = 200, description = "Updated", body = Job),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_job(
    State(state): State<JobsState>,
    Authenticated(auth): Authenticated,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(patch): ValidJson<JobPatch>,
) -> ApiResult<Job> {
    Ok(Json(state.jobs.update(&auth, id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    tag = "jobs",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_job(
    State(state): State<JobsState>,
    Authenticated(auth): Authenticated,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<MessageResponse> {
    state.jobs.delete(&auth, id).await?;
    Ok(Json(MessageResponse::new("Job deleted successfully")))
}

pub fn jobs_router(state: JobsState) -> Router {
    Router::new()
        .route("/", get(list_jobs).post(create_job))
        .route("/my-jobs", get(my_jobs))
        .route("/:id", get(get_job).put(update_job).delete(delete_job))
        .with_state(state)
}
