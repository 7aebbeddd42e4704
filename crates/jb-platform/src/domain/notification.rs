//! Notification Entity
//!
//! Notifications are only ever produced as a side effect of a workflow
//! transition; there is no client-facing create.

use chrono::{DateTime, Utc};
use jb_common::{ApplicationStatus, NotificationType};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
}

impl NewNotification {
    pub fn new(
        user_id: Uuid,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            message: message.into(),
            kind,
        }
    }

    /// Sent to the recruiter when someone applies
    pub fn new_application(recruiter_id: Uuid, job_title: &str) -> Self {
        Self::new(
            recruiter_id,
            NotificationType::Application,
            "New Application",
            format!("You have a new application for {}", job_title),
        )
    }

    /// Sent to the applicant when their application status changes
    pub fn application_update(applicant_id: Uuid, job_title: &str, status: ApplicationStatus) -> Self {
        Self::new(
            applicant_id,
            NotificationType::Application,
            "Application Update",
            format!("Your application for {} has been {}", job_title, status),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_messages() {
        let recruiter = Uuid::new_v4();
        let n = NewNotification::new_application(recruiter, "Rust Engineer");
        assert_eq!(n.title, "New Application");
        assert_eq!(n.message, "You have a new application for Rust Engineer");

        let n = NewNotification::application_update(recruiter, "Rust Engineer", ApplicationStatus::Accepted);
        assert_eq!(n.message, "Your application for Rust Engineer has been accepted");
    }

    #[test]
    fn test_kind_serializes_as_type() {
        let n = NewNotification::new_application(Uuid::new_v4(), "X");
        let row = serde_json::to_value(&n).unwrap();
        assert_eq!(row["type"], "application");
        assert!(row.get("kind").is_none());
    }
}
