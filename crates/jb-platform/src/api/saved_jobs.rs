//! Saved Jobs API

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::common::{ApiResult, MessageResponse, PaginationParams, ValidJson, ValidPath, ValidQuery};
use crate::api::middleware::Authenticated;
use crate::domain::SavedJob;
use crate::error::PlatformError;
use crate::service::{SavedJobList, SavedJobService};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveJobBody {
    pub job_id: Uuid,
}

#[derive(Clone)]
pub struct SavedJobsState {
    pub saved_jobs: Arc<SavedJobService>,
}

#[utoipa::path(
    post,
    path = "/api/saved-jobs",
    tag = "saved-jobs",
    request_body = SaveJobBody,
    responses(
        (status = 201, description = "Bookmarked", body = SavedJob),
        (status = 400, description = "Already saved"),
        (status = 404, description = "Job not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn save_job(
    State(state): State<SavedJobsState>,
    Authenticated(auth): Authenticated,
    ValidJson(body): ValidJson<SaveJobBody>,
) -> Result<(StatusCode, Json<SavedJob>), PlatformError> {
    let saved = state.saved_jobs.save(&auth, body.job_id).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

#[utoipa::path(
    get,
    path = "/api/saved-jobs",
    tag = "saved-jobs",
    params(PaginationParams),
    responses(
        (status = 200, description = "Bookmarks with listings", body = SavedJobList)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_saved_jobs(
    State(state): State<SavedJobsState>,
    Authenticated(auth): Authenticated,
    ValidQuery(params): ValidQuery<PaginationParams>,
) -> ApiResult<SavedJobList> {
    Ok(Json(state.saved_jobs.list(&auth, params.to_page_request()).await?))
}

/// Idempotent
#[utoipa::path(
    delete,
    path = "/api/saved-jobs/{job_id}",
    tag = "saved-jobs",
    params(("job_id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Removed (or was never saved)", body = MessageResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn unsave_job(
    State(state): State<SavedJobsState>,
    Authenticated(auth): Authenticated,
    ValidPath(job_id): ValidPath<Uuid>,
) -> ApiResult<MessageResponse> {
    state.saved_jobs.unsave(&auth, job_id).await?;
    Ok(Json(MessageResponse::new("Job removed from saved list")))
}

pub fn saved_jobs_router(state: SavedJobsState) -> Router {
    Router::new()
        .route("/", get(list_saved_jobs).post(save_job))
        .route("/:job_id", delete(unsave_job))
        .with_state(state)
}
