//! Generic data-access interface
//!
//! Workflows never talk to a database directly. They build a [`Query`] and
//! hand it to a [`DataStore`], which is either the PostgREST adapter or the
//! in-memory store used for development and tests.

use async_trait::async_trait;
use jb_common::PageRequest;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Tables reachable through the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Profiles,
    Jobs,
    Applications,
    SavedJobs,
    Notifications,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Profiles,
        Table::Jobs,
        Table::Applications,
        Table::SavedJobs,
        Table::Notifications,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::Jobs => "jobs",
            Table::Applications => "applications",
            Table::SavedJobs => "saved_jobs",
            Table::Notifications => "notifications",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Row predicate. Values are compared in their text form, the way the
/// PostgREST query string carries them.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(&'static str, String),
    In(&'static str, Vec<String>),
    /// Case-insensitive substring match
    ILike(&'static str, String),
    /// Case-insensitive substring match on any of the columns
    AnyILike(Vec<&'static str>, String),
    /// Array column shares at least one element with the given set
    Overlaps(&'static str, Vec<String>),
}

impl Filter {
    pub fn eq(column: &'static str, value: impl ToString) -> Self {
        Filter::Eq(column, value.to_string())
    }

    pub fn any_of<I, V>(column: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        Filter::In(column, values.into_iter().map(|v| v.to_string()).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub descending: bool,
}

/// Filter, sort and range for a select
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    /// Inclusive row range
    pub range: Option<(u64, u64)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &'static str, value: impl ToString) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn newest_first(mut self, column: &'static str) -> Self {
        self.order = Some(Order { column, descending: true });
        self
    }

    pub fn page(mut self, page: PageRequest) -> Self {
        self.range = Some(page.range());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.range = Some((0, limit.saturating_sub(1)));
        self
    }
}

/// Rows for the requested range plus the total matching count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub rows: Vec<Value>,
    pub total: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// The store refused the request because of its content
    #[error("{message}")]
    Rejected { code: Option<String>, message: String },

    /// Timeouts and connection failures; safe for the caller to retry
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store error: {0}")]
    Backend(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, table: Table, query: &Query) -> StoreResult<Selection>;

    async fn count(&self, table: Table, filters: &[Filter]) -> StoreResult<u64>;

    /// Insert one row and return it as stored
    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value>;

    /// Apply `patch` to every matching row and return the updated rows
    async fn update(&self, table: Table, filters: &[Filter], patch: Value) -> StoreResult<Vec<Value>>;

    /// Delete matching rows and return how many were removed
    async fn delete(&self, table: Table, filters: &[Filter]) -> StoreResult<u64>;

    fn name(&self) -> &'static str;
}

pub fn encode<T: Serialize>(value: &T) -> StoreResult<Value> {
    Ok(serde_json::to_value(value)?)
}

pub fn decode<T: DeserializeOwned>(row: Value) -> StoreResult<T> {
    Ok(serde_json::from_value(row)?)
}

pub fn decode_all<T: DeserializeOwned>(rows: Vec<Value>) -> StoreResult<Vec<T>> {
    rows.into_iter().map(decode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = Query::new()
            .eq("is_active", true)
            .newest_first("created_at")
            .page(PageRequest::new(3, 10));

        assert_eq!(query.filters, vec![Filter::Eq("is_active", "true".to_string())]);
        assert_eq!(query.order, Some(Order { column: "created_at", descending: true }));
        assert_eq!(query.range, Some((20, 29)));
        assert_eq!(Query::new().limit(5).range, Some((0, 4)));
    }

    #[test]
    fn test_any_of_stringifies() {
        let id = uuid::Uuid::nil();
        assert_eq!(
            Filter::any_of("id", [id]),
            Filter::In("id", vec!["00000000-0000-0000-0000-000000000000".to_string()])
        );
    }
}
