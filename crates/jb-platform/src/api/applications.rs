//! Applications API

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use jb_common::{ApplicationStatus, PageRequest, DEFAULT_PAGE_SIZE};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::common::{ApiResult, MessageResponse, ValidJson, ValidPath, ValidQuery};
use crate::api::middleware::Authenticated;
use crate::domain::Application;
use crate::error::PlatformError;
use crate::service::{ApplicationService, ApplyRequest, JobApplicationList, MyApplicationList};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyBody {
    pub job_id: Uuid,
    pub resume_url: String,
    #[serde(default)]
    pub cover_letter: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusBody {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Status filter plus paging
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApplicationsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub status: Option<ApplicationStatus>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl ApplicationsQuery {
    fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Clone)]
pub struct ApplicationsState {
    pub applications: Arc<ApplicationService>,
}

/// Apply to an active listing
#[utoipa::path(
    post,
    path = "/api/applications",
    tag = "applications",
    request_body = ApplyBody,
    responses(
        (status = 201, description = "Application submitted", body = Application),
        (status = 400, description = "Already applied or invalid input"),
        (status = 403, description = "Not a job seeker, or listing closed"),
        (status = 404, description = "Job not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn apply(
    State(state): State<ApplicationsState>,
    Authenticated(auth): Authenticated,
    ValidJson(body): ValidJson<ApplyBody>,
) -> Result<(StatusCode, Json<Application>), PlatformError> {
    let application = state
        .applications
        .apply(
            &auth,
            ApplyRequest {
                job_id: body.job_id,
                resume_url: body.resume_url,
                cover_letter: body.cover_letter,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

#[utoipa::path(
    get,
    path = "/api/applications/my-applications",
    tag = "applications",
    params(ApplicationsQuery),
    responses(
        (status = 200, description = "The caller's applications", body = MyApplicationList)
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_applications(
    State(state): State<ApplicationsState>,
    Authenticated(auth): Authenticated,
    ValidQuery(query): ValidQuery<ApplicationsQuery>,
) -> ApiResult<MyApplicationList> {
    let page = query.page_request();
    Ok(Json(state.applications.list_mine(&auth, query.status, page).await?))
}

/// Applications received by one listing
#[utoipa::path(
    get,
    path = "/api/applications/job/{job_id}",
    tag = "applications",
    params(("job_id" = Uuid, Path, description = "Job id"), ApplicationsQuery),
    responses(
        (status = 200, description = "Applications with applicant summaries", body = JobApplicationList),
        (status = 403, description = "Not the listing owner"),
        (status = 404, description = "Job not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn job_applications(
    State(state): State<ApplicationsState>,
    Authenticated(auth): Authenticated,
    ValidPath(job_id): ValidPath<Uuid>,
    ValidQuery(query): ValidQuery<ApplicationsQuery>,
) -> ApiResult<JobApplicationList> {
    let page = query.page_request();
    Ok(Json(
        state
            .applications
            .list_for_job(&auth, job_id, query.status, page)
            .await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}/status",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = StatusBody,
    responses(
        (status = 200, description = "Status updated", body = Application),
        (status = 400, description = "Unknown or disallowed status"),
        (status = 403, description = "Not the listing owner"),
        (status = 404, description = "Application not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_status(
    State(state): State<ApplicationsState>,
    Authenticated(auth): Authenticated,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(body): ValidJson<StatusBody>,
) -> ApiResult<Application> {
    Ok(Json(
        state
            .applications
            .update_status(&auth, id, body.status, body.notes)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/applications/{id}",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application id")),
    responses(
        (status = 200, description = "Withdrawn", body = MessageResponse),
        (status = 403, description = "Not the applicant"),
        (status = 404, description = "Application not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn withdraw(
    State(state): State<ApplicationsState>,
    Authenticated(auth): Authenticated,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<MessageResponse> {
    state.applications.withdraw(&auth, id).await?;
    Ok(Json(MessageResponse::new("Application withdrawn successfully")))
}

pub fn applications_router(state: ApplicationsState) -> Router {
    Router::new()
        .route("/", post(apply))
        .route("/my-applications", get(my_applications))
        .route("/job/:job_id", get(job_applications))
        .route("/:id/status", patch(update_status))
        .route("/:id", delete(withdraw))
        .with_state(state)
}
