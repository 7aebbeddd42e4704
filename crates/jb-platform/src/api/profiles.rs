//! Profiles API

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::common::{ApiResult, ValidJson, ValidPath};
use crate::api::middleware::Authenticated;
use crate::domain::{Profile, ProfilePatch};
use crate::service::ProfileService;

/// Durable URL of a resume already uploaded to blob storage
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResumeBody {
    pub resume_url: String,
}

#[derive(Clone)]
pub struct ProfilesState {
    pub profiles: Arc<ProfileService>,
}

#[utoipa::path(
    get,
    path = "/api/profiles/{id}",
    tag = "profiles",
    params(("id" = Uuid, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 404, description = "Profile not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    State(state): State<ProfilesState>,
    _auth: Authenticated,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Profile> {
    Ok(Json(state.profiles.get(id).await?))
}

/// Partial update of the caller's own profile
#[utoipa::path(
    put,
    path = "/api/profiles/{id}",
    tag = "profiles",
    params(("id" = Uuid, Path, description = "Profile id")),
    request_body = ProfilePatch,
    responses(
        (status = 200, description = "Updated profile", body = Profile),
        (status = 400, description = "Invalid fields"),
        (status = 403, description = "Not the caller's profile")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(state): State<ProfilesState>,
    Authenticated(auth): Authenticated,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(patch): ValidJson<ProfilePatch>,
) -> ApiResult<Profile> {
    Ok(Json(state.profiles.update(&auth, id, patch).await?))
}

#[utoipa::path(
    post,
    path = "/api/profiles/resume",
    tag = "profiles",
    request_body = ResumeBody,
    responses(
        (status = 200, description = "Profile with the new resume URL", body = Profile),
        (status = 400, description = "Missing URL")
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_resume(
    State(state): State<ProfilesState>,
    Authenticated(auth): Authenticated,
    ValidJson(body): ValidJson<ResumeBody>,
) -> ApiResult<Profile> {
    Ok(Json(state.profiles.set_resume(&auth, &body.resume_url).await?))
}

pub fn profiles_router(state: ProfilesState) -> Router {
    Router::new()
        .route("/resume", post(set_resume))
        .route("/:id", get(get_profile).put(update_profile))
        .with_state(state)
}
