//! OpenAPI Documentation

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::common::{ApiError, MessageResponse};

/// Job Board API OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Job Board API",
        version = "1.0.0",
        description = "Job listings, applications, saved jobs and notifications"
    ),
    servers(
        (url = "http://localhost:3001", description = "Local development")
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Sign-up, sign-in and session"),
        (name = "profiles", description = "User profiles"),
        (name = "jobs", description = "Job listings"),
        (name = "applications", description = "Job applications"),
        (name = "saved-jobs", description = "Bookmarked listings"),
        (name = "notifications", description = "In-app notifications"),
        (name = "admin", description = "Moderation and statistics"),
        (name = "monitoring", description = "Health")
    ),
    paths(
        // Auth
        super::auth::sign_up,
        super::auth::sign_in,
        super::auth::sign_out,
        super::auth::me,
        // Profiles
        super::profiles::get_profile,
        super::profiles::update_profile,
        super::profiles::set_resume,
        // Jobs
        super::jobs::list_jobs,
        super::jobs::my_jobs,
        super::jobs::get_job,
        super::jobs::create_job,
        super::jobs::update_job,
        super::jobs::delete_job,
        // Applications
        super::applications::apply,
        super::applications::my_applications,
        super::applications::job_applications,
        super::applications::update_status,
        super::applications::withdraw,
        // Saved jobs
        super::saved_jobs::save_job,
        super::saved_jobs::list_saved_jobs,
        super::saved_jobs::unsave_job,
        // Notifications
        super::notifications::list_notifications,
        super::notifications::mark_read,
        super::notifications::mark_all_read,
        // Admin
        super::admin::list_users,
        super::admin::update_user_status,
        super::admin::delete_user,
        super::admin::list_jobs,
        super::admin::stats,
        // Monitoring
        super::monitoring::health,
    ),
    components(schemas(ApiError, MessageResponse))
)]
pub struct JobBoardApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document() {
        let doc = JobBoardApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();

        assert!(json["paths"]["/api/jobs/{id}"].is_object());
        assert!(json["paths"]["/api/applications/{id}/status"]["patch"].is_object());
        assert!(json["components"]["securitySchemes"]["bearer_auth"].is_object());
    }
}
