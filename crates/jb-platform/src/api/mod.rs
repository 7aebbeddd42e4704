//! REST API Layer
//!
//! Axum routers for every workflow, plus the assembled application router.

pub mod common;
pub mod middleware;
pub mod auth;
pub mod profiles;
pub mod jobs;
pub mod applications;
pub mod saved_jobs;
pub mod notifications;
pub mod admin;
pub mod monitoring;
pub mod dev;
pub mod openapi;

pub use common::{ApiError, ApiResult, MessageResponse, PaginationParams, ValidJson, ValidPath, ValidQuery};
pub use middleware::{AuthState, Authenticated, RateLimit};
pub use openapi::JobBoardApiDoc;

pub use admin::{admin_router, AdminState};
pub use applications::{applications_router, ApplicationsState};
pub use auth::{auth_router, AuthApiState};
pub use dev::{dev_router, DevState};
pub use jobs::{jobs_router, JobsState};
pub use monitoring::monitoring_router;
pub use notifications::{notifications_router, NotificationsState};
pub use profiles::{profiles_router, ProfilesState};
pub use saved_jobs::{saved_jobs_router, SavedJobsState};

use std::any::Any;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json, Router,
};
use jb_config::ServerConfig;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::error;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::platform::Platform;

/// Assemble the full application router.
///
/// Returns the rate limiter too, so the caller can purge idle client
/// state periodically.
pub fn build_router(platform: &Platform, server: &ServerConfig) -> (Router, Option<RateLimit>) {
    let mut api = Router::new()
        .nest("/auth", auth_router(AuthApiState {
            accounts: platform.accounts.clone(),
        }))
        .nest("/profiles", profiles_router(ProfilesState {
            profiles: platform.profiles.clone(),
        }))
        .nest("/jobs", jobs_router(JobsState {
            jobs: platform.jobs.clone(),
        }))
        .nest("/applications", applications_router(ApplicationsState {
            applications: platform.applications.clone(),
        }))
        .nest("/saved-jobs", saved_jobs_router(SavedJobsState {
            saved_jobs: platform.saved_jobs.clone(),
        }))
        .nest("/notifications", notifications_router(NotificationsState {
            notifications: platform.notifications.clone(),
        }))
        .nest("/admin", admin_router(AdminState {
            admin: platform.admin.clone(),
        }));

    if server.dev_routes {
        api = api.nest("/dev", dev_router(DevState {
            profiles: platform.profile_repo.clone(),
        }));
    }

    let rate_limit = RateLimit::new(
        server.rate_limit_max,
        Duration::from_secs(server.rate_limit_window_secs),
    );
    if let Some(limit) = rate_limit.clone() {
        api = api.layer(axum::middleware::from_fn_with_state(limit, middleware::rate_limit));
    }

    let app = Router::new()
        .nest("/api", api)
        .merge(monitoring_router())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", JobBoardApiDoc::openapi()))
        .layer(Extension(AuthState {
            resolver: platform.resolver.clone(),
        }))
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs)))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(AnyOrigin).allow_methods(AnyOrigin).allow_headers(AnyOrigin));

    (middleware::with_security_headers(app), rate_limit)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "Handler panicked");

    let body = ApiError::new("INTERNAL_ERROR", "Something went wrong!");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
