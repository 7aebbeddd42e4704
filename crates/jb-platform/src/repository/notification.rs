//! Notification Repository

use std::sync::Arc;
use uuid::Uuid;

use super::store::{decode, decode_all, encode, DataStore, Filter, Query, StoreResult, Table};
use crate::domain::{NewNotification, Notification};

pub struct NotificationRepository {
    store: Arc<dyn DataStore>,
}

impl NotificationRepository {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn insert(&self, notification: &NewNotification) -> StoreResult<Notification> {
        decode(self.store.insert(Table::Notifications, encode(notification)?).await?)
    }

    /// Newest first
    pub async fn find_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: u64,
    ) -> StoreResult<Vec<Notification>> {
        let mut query = Query::new().eq("user_id", user_id);
        if unread_only {
            query = query.eq("is_read", false);
        }
        let query = query.newest_first("created_at").limit(limit);
        decode_all(self.store.select(Table::Notifications, &query).await?.rows)
    }

    pub async fn count_unread(&self, user_id: Uuid) -> StoreResult<u64> {
        self.store
            .count(
                Table::Notifications,
                &[Filter::eq("user_id", user_id), Filter::eq("is_read", false)],
            )
            .await
    }

    /// Scoped to the owner, so another user's id simply matches nothing
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Notification>> {
        let rows = self
            .store
            .update(
                Table::Notifications,
                &[Filter::eq("id", id), Filter::eq("user_id", user_id)],
                serde_json::json!({ "is_read": true }),
            )
            .await?;
        rows.into_iter().next().map(decode).transpose()
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> StoreResult<u64> {
        let rows = self
            .store
            .update(
                Table::Notifications,
                &[Filter::eq("user_id", user_id), Filter::eq("is_read", false)],
                serde_json::json!({ "is_read": true }),
            )
            .await?;
        Ok(rows.len() as u64)
    }
}
