//! Profile Repository

use jb_common::{PageRequest, UserRole};
use std::sync::Arc;
use uuid::Uuid;

use super::store::{decode, decode_all, encode, DataStore, Filter, Query, StoreResult, Table};
use super::{touched, Page};
use crate::domain::{NewProfile, Profile, ProfilePatch, ProfileStatusPatch};

/// Admin user-list filters
#[derive(Debug, Clone, Default)]
pub struct ProfileSearch {
    pub role: Option<UserRole>,
    /// Substring of name or email
    pub search: Option<String>,
}

pub struct ProfileRepository {
    store: Arc<dyn DataStore>,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn insert(&self, profile: &NewProfile) -> StoreResult<Profile> {
        decode(self.store.insert(Table::Profiles, encode(profile)?).await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        let selection = self
            .store
            .select(Table::Profiles, &Query::new().eq("id", id).limit(1))
            .await?;
        selection.rows.into_iter().next().map(decode).transpose()
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let selection = self
            .store
            .select(Table::Profiles, &Query::new().filter(Filter::any_of("id", ids)))
            .await?;
        decode_all(selection.rows)
    }

    pub async fn search(&self, search: &ProfileSearch, page: PageRequest) -> StoreResult<Page<Profile>> {
        let mut query = Query::new().newest_first("created_at").page(page);
        if let Some(role) = search.role {
            query = query.eq("role", role);
        }
        if let Some(term) = search.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(Filter::AnyILike(vec!["full_name", "email"], term.to_string()));
        }

        let selection = self.store.select(Table::Profiles, &query).await?;
        Ok(Page {
            items: decode_all(selection.rows)?,
            total: selection.total,
        })
    }

    pub async fn update(&self, id: Uuid, patch: &ProfilePatch) -> StoreResult<Option<Profile>> {
        let rows = self
            .store
            .update(Table::Profiles, &[Filter::eq("id", id)], touched(patch)?)
            .await?;
        rows.into_iter().next().map(decode).transpose()
    }

    pub async fn update_status(&self, id: Uuid, patch: &ProfileStatusPatch) -> StoreResult<Option<Profile>> {
        let rows = self
            .store
            .update(Table::Profiles, &[Filter::eq("id", id)], touched(patch)?)
            .await?;
        rows.into_iter().next().map(decode).transpose()
    }

    pub async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.store.delete(Table::Profiles, &[Filter::eq("id", id)]).await? > 0)
    }

    pub async fn count(&self, role: Option<UserRole>) -> StoreResult<u64> {
        let filters: Vec<Filter> = role.into_iter().map(|r| Filter::eq("role", r)).collect();
        self.store.count(Table::Profiles, &filters).await
    }
}
