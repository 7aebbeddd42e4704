//! Saved Job Repository

use jb_common::PageRequest;
use std::sync::Arc;
use uuid::Uuid;

use super::store::{decode, decode_all, encode, DataStore, Filter, Query, StoreResult, Table};
use super::Page;
use crate::domain::{NewSavedJob, SavedJob};

pub struct SavedJobRepository {
    store: Arc<dyn DataStore>,
}

impl SavedJobRepository {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn insert(&self, saved: &NewSavedJob) -> StoreResult<SavedJob> {
        decode(self.store.insert(Table::SavedJobs, encode(saved)?).await?)
    }

    pub async fn find_by_user(&self, user_id: Uuid, page: PageRequest) -> StoreResult<Page<SavedJob>> {
        let query = Query::new()
            .eq("user_id", user_id)
            .newest_first("created_at")
            .page(page);
        let selection = self.store.select(Table::SavedJobs, &query).await?;
        Ok(Page {
            items: decode_all(selection.rows)?,
            total: selection.total,
        })
    }

    /// Returns the number of bookmarks removed (0 or 1)
    pub async fn delete(&self, job_id: Uuid, user_id: Uuid) -> StoreResult<u64> {
        self.store
            .delete(
                Table::SavedJobs,
                &[Filter::eq("job_id", job_id), Filter::eq("user_id", user_id)],
            )
            .await
    }
}
