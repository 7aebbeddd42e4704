//! Admin API
//!
//! Moderation endpoints. Each handler obtains an
//! [`AdminGrant`](crate::service::AdminGrant) before
//! touching the elevated store.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, patch},
    Json, Router,
};
use jb_common::{PageRequest, UserRole};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::common::{ApiResult, MessageResponse, ValidJson, ValidPath, ValidQuery};
use crate::api::middleware::Authenticated;
use crate::domain::{Profile, ProfileStatusPatch};
use crate::repository::ProfileSearch;
use crate::service::admin::DEFAULT_ADMIN_PAGE_SIZE;
use crate::service::{checks, AdminService, JobList, PlatformStats, UserList};

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_ADMIN_PAGE_SIZE
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsersQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub role: Option<UserRole>,
    /// Substring of name or email
    pub search: Option<String>,
}

/// Listing status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatusFilter {
    Active,
    Inactive,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminJobsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub status: Option<JobStatusFilter>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusBody {
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_verified: Option<bool>,
}

#[derive(Clone)]
pub struct AdminState {
    pub admin: Arc<AdminService>,
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    params(UsersQuery),
    responses(
        (status = 200, description = "Profiles", body = UserList),
        (status = 403, description = "Not an admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AdminState>,
    Authenticated(auth): Authenticated,
    ValidQuery(query): ValidQuery<UsersQuery>,
) -> ApiResult<UserList> {
    let grant = checks::require_admin(&auth)?;
    let page = PageRequest::new(query.page, query.limit);
    let filter = ProfileSearch {
        role: query.role,
        search: query.search,
    };
    Ok(Json(state.admin.list_users(&grant, filter, page).await?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{user_id}/status",
    tag = "admin",
    params(("user_id" = Uuid, Path, description = "User id")),
    request_body = UserStatusBody,
    responses(
        (status = 200, description = "Updated profile", body = Profile),
        (status = 400, description = "No flags given"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user_status(
    State(state): State<AdminState>,
    Authenticated(auth): Authenticated,
    ValidPath(user_id): ValidPath<Uuid>,
    ValidJson(body): ValidJson<UserStatusBody>,
) -> ApiResult<Profile> {
    let grant = checks::require_admin(&auth)?;
    let patch = ProfileStatusPatch {
        is_active: body.is_active,
        is_verified: body.is_verified,
    };
    Ok(Json(state.admin.update_user_status(&grant, user_id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{user_id}",
    tag = "admin",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<AdminState>,
    Authenticated(auth): Authenticated,
    ValidPath(user_id): ValidPath<Uuid>,
) -> ApiResult<MessageResponse> {
    let grant = checks::require_admin(&auth)?;
    state.admin.delete_user(&grant, user_id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/admin/jobs",
    tag = "admin",
    params(AdminJobsQuery),
    responses(
        (status = 200, description = "All listings with recruiter contact", body = JobList),
        (status = 403, description = "Not an admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_jobs(
    State(state): State<AdminState>,
    Authenticated(auth): Authenticated,
    ValidQuery(query): ValidQuery<AdminJobsQuery>,
) -> ApiResult<JobList> {
    let grant = checks::require_admin(&auth)?;
    let is_active = query.status.map(|s| s == JobStatusFilter::Active);
    let page = PageRequest::new(query.page, query.limit);
    Ok(Json(state.admin.list_jobs(&grant, is_active, page).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "admin",
    responses(
        (status = 200, description = "Platform counts", body = PlatformStats),
        (status = 403, description = "Not an admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn stats(
    State(state): State<AdminState>,
    Authenticated(auth): Authenticated,
) -> ApiResult<PlatformStats> {
    let grant = checks::require_admin(&auth)?;
    Ok(Json(state.admin.stats(&grant).await?))
}

pub fn admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:user_id/status", patch(update_user_status))
        .route("/users/:user_id", axum::routing::delete(delete_user))
        .route("/jobs", get(list_jobs))
        .route("/stats", get(stats))
        .with_state(state)
}
