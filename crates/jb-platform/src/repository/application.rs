//! Application Repository

use jb_common::{ApplicationStatus, PageRequest};
use std::sync::Arc;
use uuid::Uuid;

use super::store::{decode, decode_all, encode, DataStore, Filter, Query, StoreResult, Table};
use super::Page;
use crate::domain::{Application, NewApplication, StatusChange};

pub struct ApplicationRepository {
    store: Arc<dyn DataStore>,
}

impl ApplicationRepository {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn insert(&self, application: &NewApplication) -> StoreResult<Application> {
        decode(self.store.insert(Table::Applications, encode(application)?).await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Application>> {
        let selection = self
            .store
            .select(Table::Applications, &Query::new().eq("id", id).limit(1))
            .await?;
        selection.rows.into_iter().next().map(decode).transpose()
    }

    pub async fn exists_for(&self, job_id: Uuid, applicant_id: Uuid) -> StoreResult<bool> {
        let count = self
            .store
            .count(
                Table::Applications,
                &[Filter::eq("job_id", job_id), Filter::eq("applicant_id", applicant_id)],
            )
            .await?;
        Ok(count > 0)
    }

    pub async fn find_by_applicant(
        &self,
        applicant_id: Uuid,
        status: Option<ApplicationStatus>,
        page: PageRequest,
    ) -> StoreResult<Page<Application>> {
        self.find_page(Query::new().eq("applicant_id", applicant_id), status, page)
            .await
    }

    pub async fn find_by_job(
        &self,
        job_id: Uuid,
        status: Option<ApplicationStatus>,
        page: PageRequest,
    ) -> StoreResult<Page<Application>> {
        self.find_page(Query::new().eq("job_id", job_id), status, page).await
    }

    async fn find_page(
        &self,
        mut query: Query,
        status: Option<ApplicationStatus>,
        page: PageRequest,
    ) -> StoreResult<Page<Application>> {
        if let Some(status) = status {
            query = query.eq("status", status);
        }
        let query = query.newest_first("applied_at").page(page);
        let selection = self.store.select(Table::Applications, &query).await?;
        Ok(Page {
            items: decode_all(selection.rows)?,
            total: selection.total,
        })
    }

    pub async fn update_status(&self, id: Uuid, change: &StatusChange) -> StoreResult<Option<Application>> {
        let rows = self
            .store
            .update(Table::Applications, &[Filter::eq("id", id)], encode(change)?)
            .await?;
        rows.into_iter().next().map(decode).transpose()
    }

    pub async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.store.delete(Table::Applications, &[Filter::eq("id", id)]).await? > 0)
    }

    pub async fn count(&self) -> StoreResult<u64> {
        self.store.count(Table::Applications, &[]).await
    }
}
