//! Job Repository

use jb_common::{ExperienceLevel, JobType, PageRequest};
use std::sync::Arc;
use uuid::Uuid;

use super::store::{decode, decode_all, encode, DataStore, Filter, Query, StoreResult, Table};
use super::{touched, Page};
use crate::domain::{Job, JobPatch, NewJob};

/// Listing filters; every field is optional and they combine with AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSearch {
    /// Substring of title, description or company name
    pub search: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub experience_level: Option<ExperienceLevel>,
    /// Matches listings requiring any of these skills
    pub skills: Vec<String>,
    pub recruiter_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

impl JobSearch {
    /// Public search; always restricted to active listings
    pub fn active() -> Self {
        Self {
            is_active: Some(true),
            ..Default::default()
        }
    }

    /// Split a comma-separated skills parameter
    pub fn parse_skills(csv: &str) -> Vec<String> {
        csv.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(active) = self.is_active {
            filters.push(Filter::eq("is_active", active));
        }
        if let Some(recruiter_id) = self.recruiter_id {
            filters.push(Filter::eq("recruiter_id", recruiter_id));
        }
        if let Some(term) = non_blank(&self.search) {
            filters.push(Filter::AnyILike(
                vec!["title", "description", "company_name"],
                term,
            ));
        }
        if let Some(location) = non_blank(&self.location) {
            filters.push(Filter::ILike("location", location));
        }
        if let Some(job_type) = self.job_type {
            filters.push(Filter::eq("job_type", job_type));
        }
        if let Some(level) = self.experience_level {
            filters.push(Filter::eq("experience_level", level));
        }
        if !self.skills.is_empty() {
            filters.push(Filter::Overlaps("required_skills", self.skills.clone()));
        }
        filters
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub struct JobRepository {
    store: Arc<dyn DataStore>,
}

impl JobRepository {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn insert(&self, job: &NewJob) -> StoreResult<Job> {
        decode(self.store.insert(Table::Jobs, encode(job)?).await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Job>> {
        let selection = self
            .store
            .select(Table::Jobs, &Query::new().eq("id", id).limit(1))
            .await?;
        selection.rows.into_iter().next().map(decode).transpose()
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Job>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let selection = self
            .store
            .select(Table::Jobs, &Query::new().filter(Filter::any_of("id", ids)))
            .await?;
        decode_all(selection.rows)
    }

    pub async fn search(&self, search: &JobSearch, page: PageRequest) -> StoreResult<Page<Job>> {
        let query = Query {
            filters: search.filters(),
            ..Query::new()
        }
        .newest_first("created_at")
        .page(page);

        let selection = self.store.select(Table::Jobs, &query).await?;
        Ok(Page {
            items: decode_all(selection.rows)?,
            total: selection.total,
        })
    }

    pub async fn update(&self, id: Uuid, patch: &JobPatch) -> StoreResult<Option<Job>> {
        let rows = self
            .store
            .update(Table::Jobs, &[Filter::eq("id", id)], touched(patch)?)
            .await?;
        rows.into_iter().next().map(decode).transpose()
    }

    pub async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.store.delete(Table::Jobs, &[Filter::eq("id", id)]).await? > 0)
    }

    pub async fn count(&self, is_active: Option<bool>) -> StoreResult<u64> {
        let filters: Vec<Filter> = is_active
            .into_iter()
            .map(|a| Filter::eq("is_active", a))
            .collect();
        self.store.count(Table::Jobs, &filters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skills() {
        assert_eq!(
            JobSearch::parse_skills(" rust, ,postgres ,"),
            vec!["rust".to_string(), "postgres".to_string()]
        );
        assert!(JobSearch::parse_skills("").is_empty());
    }

    #[test]
    fn test_filters_skip_blank_terms() {
        let search = JobSearch {
            search: Some("  ".to_string()),
            location: Some("Berlin".to_string()),
            job_type: Some(JobType::Contract),
            ..JobSearch::active()
        };
        assert_eq!(
            search.filters(),
            vec![
                Filter::Eq("is_active", "true".to_string()),
                Filter::ILike("location", "Berlin".to_string()),
                Filter::Eq("job_type", "contract".to_string()),
            ]
        );
    }
}
