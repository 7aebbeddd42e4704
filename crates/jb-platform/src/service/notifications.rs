//! Notification Sink
//!
//! Workflows call [`NotificationService::notify_best_effort`] after their
//! primary write succeeded. The insert is awaited, and a failure is logged
//! and swallowed so it never changes the outcome of the parent operation.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{NewNotification, Notification};
use crate::error::{PlatformError, Result};
use crate::repository::NotificationRepository;

pub const DEFAULT_NOTIFICATION_LIMIT: u64 = 50;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MarkAllReadResult {
    pub updated: u64,
}

pub struct NotificationService {
    notifications: Arc<NotificationRepository>,
}

impl NotificationService {
    pub fn new(notifications: Arc<NotificationRepository>) -> Self {
        Self { notifications }
    }

    /// Returns whether the row was written
    pub async fn notify_best_effort(&self, notification: NewNotification) -> bool {
        match self.notifications.insert(&notification).await {
            Ok(saved) => {
                debug!(
                    notification_id = %saved.id,
                    user_id = %saved.user_id,
                    kind = %saved.kind,
                    "Notification recorded"
                );
                true
            }
            Err(e) => {
                warn!(
                    user_id = %notification.user_id,
                    kind = %notification.kind,
                    error = %e,
                    "Failed to record notification"
                );
                false
            }
        }
    }

    pub async fn list(&self, user_id: Uuid, unread_only: bool, limit: Option<u64>) -> Result<NotificationList> {
        let limit = limit
            .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
            .clamp(1, jb_common::MAX_PAGE_SIZE as u64);
        let notifications = self.notifications.find_for_user(user_id, unread_only, limit).await?;
        let unread_count = self.notifications.count_unread(user_id).await?;
        Ok(NotificationList {
            notifications,
            unread_count,
        })
    }

    /// Another user's notification is reported as missing
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Notification> {
        self.notifications
            .mark_read(id, user_id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Notification", id))
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<MarkAllReadResult> {
        let updated = self.notifications.mark_all_read(user_id).await?;
        Ok(MarkAllReadResult { updated })
    }
}
