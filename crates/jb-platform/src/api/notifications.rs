//! Notifications API

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::api::common::{ApiResult, ValidPath, ValidQuery};
use crate::api::middleware::Authenticated;
use crate::domain::Notification;
use crate::service::{MarkAllReadResult, NotificationList, NotificationService};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<u64>,
}

#[derive(Clone)]
pub struct NotificationsState {
    pub notifications: Arc<NotificationService>,
}

/// Newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "notifications",
    params(NotificationsQuery),
    responses(
        (status = 200, description = "The caller's notifications", body = NotificationList)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_notifications(
    State(state): State<NotificationsState>,
    Authenticated(auth): Authenticated,
    ValidQuery(query): ValidQuery<NotificationsQuery>,
) -> ApiResult<NotificationList> {
    Ok(Json(
        state
            .notifications
            .list(auth.user_id, query.unread_only, query.limit)
            .await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    tag = "notifications",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Marked read", body = Notification),
        (status = 404, description = "Not found for this user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_read(
    State(state): State<NotificationsState>,
    Authenticated(auth): Authenticated,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Notification> {
    Ok(Json(state.notifications.mark_read(id, auth.user_id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/notifications/read-all",
    tag = "notifications",
    responses(
        (status = 200, description = "Number of notifications marked read", body = MarkAllReadResult)
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_all_read(
    State(state): State<NotificationsState>,
    Authenticated(auth): Authenticated,
) -> ApiResult<MarkAllReadResult> {
    Ok(Json(state.notifications.mark_all_read(auth.user_id).await?))
}

pub fn notifications_router(state: NotificationsState) -> Router {
    Router::new()
        .route("/", get(list_notifications))
        .route("/read-all", patch(mark_all_read))
        .route("/:id/read", patch(mark_read))
        .with_state(state)
}
