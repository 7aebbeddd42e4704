//! In-memory data store
//!
//! Behaves like the hosted tables for everything the workflows depend on:
//! column defaults, unique constraints, cascading deletes and the
//! `applications_count` counter. Used by the `memory` backend and by tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use tracing::debug;
use uuid::Uuid;

use super::store::{DataStore, Filter, Query, Selection, StoreError, StoreResult, Table};

type Row = Map<String, Value>;

/// Column sets that must be unique per table, besides `id`
fn unique_keys(table: Table) -> &'static [&'static [&'static str]] {
    match table {
        Table::Applications => &[&["job_id", "applicant_id"]],
        Table::SavedJobs => &[&["job_id", "user_id"]],
        _ => &[],
    }
}

/// Foreign keys declared `ON DELETE CASCADE`: (child table, child column)
fn cascades(table: Table) -> &'static [(Table, &'static str)] {
    match table {
        Table::Profiles => &[
            (Table::Jobs, "recruiter_id"),
            (Table::Applications, "applicant_id"),
            (Table::SavedJobs, "user_id"),
            (Table::Notifications, "user_id"),
        ],
        Table::Jobs => &[(Table::Applications, "job_id"), (Table::SavedJobs, "job_id")],
        _ => &[],
    }
}

fn column_defaults(table: Table, now: &str) -> Vec<(&'static str, Value)> {
    match table {
        Table::Profiles => vec![
            ("skills", json!([])),
            ("education", json!([])),
            ("experience_years", json!(0)),
            ("is_verified", json!(false)),
            ("is_active", json!(true)),
            ("created_at", json!(now)),
            ("updated_at", json!(now)),
        ],
        Table::Jobs => vec![
            ("salary_currency", json!("USD")),
            ("required_skills", json!([])),
            ("benefits", json!([])),
            ("is_active", json!(true)),
            ("views_count", json!(0)),
            ("applications_count", json!(0)),
            ("created_at", json!(now)),
            ("updated_at", json!(now)),
        ],
        Table::Applications => vec![
            ("status", json!("pending")),
            ("applied_at", json!(now)),
            ("updated_at", json!(now)),
        ],
        Table::SavedJobs => vec![("created_at", json!(now))],
        Table::Notifications => vec![("is_read", json!(false)), ("created_at", json!(now))],
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
    failing_writes: RwLock<HashSet<Table>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `table` fail with a backend error
    pub fn fail_writes_to(&self, table: Table) {
        self.failing_writes.write().insert(table);
    }

    pub fn restore_writes_to(&self, table: Table) {
        self.failing_writes.write().remove(&table);
    }

    /// Simulate an unreachable store; every call returns `Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    /// Number of rows currently in `table`
    pub fn len(&self, table: Table) -> usize {
        self.tables.read().get(&table).map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self, table: Table) -> bool {
        self.len(table) == 0
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }

    fn check_writable(&self, table: Table) -> StoreResult<()> {
        self.check_available()?;
        if self.failing_writes.read().contains(&table) {
            return Err(StoreError::Backend(format!("writes to {} are failing", table)));
        }
        Ok(())
    }

    fn adjust_applications_count(tables: &mut HashMap<Table, Vec<Row>>, job_id: Option<&Value>, delta: i64) {
        let Some(job_id) = job_id.and_then(text) else {
            return;
        };
        if let Some(job) = tables
            .entry(Table::Jobs)
            .or_default()
            .iter_mut()
            .find(|row| row.get("id").and_then(text).as_deref() == Some(job_id.as_str()))
        {
            let current = job.get("applications_count").and_then(Value::as_i64).unwrap_or(0);
            job.insert("applications_count".to_string(), json!((current + delta).max(0)));
        }
    }

    fn delete_where(
        tables: &mut HashMap<Table, Vec<Row>>,
        table: Table,
        predicate: &dyn Fn(&Row) -> bool,
    ) -> Vec<Row> {
        let rows = tables.entry(table).or_default();
        let (removed, kept): (Vec<Row>, Vec<Row>) = rows.drain(..).partition(|row| predicate(row));
        *rows = kept;

        for row in &removed {
            if table == Table::Applications {
                Self::adjust_applications_count(tables, row.get("job_id"), -1);
            }
            if let Some(parent_id) = row.get("id").and_then(text) {
                for (child, column) in cascades(table) {
                    let parent_id = parent_id.clone();
                    Self::delete_where(tables, *child, &move |r: &Row| {
                        r.get(*column).and_then(text).as_deref() == Some(parent_id.as_str())
                    });
                }
            }
        }
        removed
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, table: Table, query: &Query) -> StoreResult<Selection> {
        self.check_available()?;
        let tables = self.tables.read();
        let mut rows: Vec<&Row> = tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| matches_all(r, &query.filters)).collect())
            .unwrap_or_default();

        if let Some(order) = &query.order {
            if order.descending {
                // later inserts win ties
                rows.reverse();
                rows.sort_by(|a, b| compare(b.get(order.column), a.get(order.column)));
            } else {
                rows.sort_by(|a, b| compare(a.get(order.column), b.get(order.column)));
            }
        }

        let total = rows.len() as u64;
        let page: Vec<Value> = match query.range {
            Some((from, to)) => rows
                .into_iter()
                .skip(from as usize)
                .take((to.saturating_sub(from) + 1) as usize)
                .map(|r| Value::Object(r.clone()))
                .collect(),
            None => rows.into_iter().map(|r| Value::Object(r.clone())).collect(),
        };

        Ok(Selection { rows: page, total })
    }

    async fn count(&self, table: Table, filters: &[Filter]) -> StoreResult<u64> {
        self.check_available()?;
        let tables = self.tables.read();
        Ok(tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| matches_all(r, filters)).count() as u64)
            .unwrap_or(0))
    }

    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value> {
        self.check_writable(table)?;
        let Value::Object(mut row) = row else {
            return Err(StoreError::Rejected {
                code: None,
                message: "Insert payload must be an object".to_string(),
            });
        };

        let now = Utc::now().to_rfc3339();
        row.entry("id").or_insert_with(|| json!(Uuid::new_v4()));
        for (column, value) in column_defaults(table, &now) {
            row.entry(column).or_insert(value);
        }

        let mut tables = self.tables.write();
        let rows = tables.entry(table).or_default();

        let mut keys: Vec<&[&str]> = vec![&["id"][..]];
        keys.extend(unique_keys(table).iter().copied());
        for key in keys {
            // NULLs never collide
            let clash = rows.iter().any(|existing| {
                key.iter().all(|c| {
                    let new = text_of(&row, c);
                    new.is_some() && new == text_of(existing, c)
                })
            });
            if clash {
                return Err(StoreError::UniqueViolation {
                    constraint: format!("{}_{}_key", table.name(), key.join("_")),
                });
            }
        }

        rows.push(row.clone());
        if table == Table::Applications {
            Self::adjust_applications_count(&mut tables, row.get("job_id"), 1);
        }
        debug!(table = %table, "memory insert");
        Ok(Value::Object(row))
    }

    async fn update(&self, table: Table, filters: &[Filter], patch: Value) -> StoreResult<Vec<Value>> {
        self.check_writable(table)?;
        let Value::Object(patch) = patch else {
            return Err(StoreError::Rejected {
                code: None,
                message: "Update payload must be an object".to_string(),
            });
        };

        let mut tables = self.tables.write();
        let mut updated = Vec::new();
        for row in tables.entry(table).or_default().iter_mut() {
            if matches_all(row, filters) {
                for (k, v) in &patch {
                    row.insert(k.clone(), v.clone());
                }
                updated.push(Value::Object(row.clone()));
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> StoreResult<u64> {
        self.check_writable(table)?;
        let mut tables = self.tables.write();
        let removed = Self::delete_where(&mut tables, table, &|row: &Row| matches_all(row, filters));
        Ok(removed.len() as u64)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

// ============================================================================
// Filtering and ordering
// ============================================================================

/// Text form of a scalar, matching how PostgREST compares filter values
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_of(row: &Row, column: &str) -> Option<String> {
    row.get(column).and_then(text)
}

fn matches_all(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|f| matches(row, f))
}

fn matches(row: &Row, filter: &Filter) -> bool {
    match filter {
        Filter::Eq(column, value) => text_of(row, column).as_deref() == Some(value.as_str()),
        Filter::In(column, values) => text_of(row, column).is_some_and(|v| values.contains(&v)),
        Filter::ILike(column, needle) => contains_ci(text_of(row, column), needle),
        Filter::AnyILike(columns, needle) => columns
            .iter()
            .any(|c| contains_ci(text_of(row, c), needle)),
        Filter::Overlaps(column, values) => match row.get(*column) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(text)
                .any(|item| values.contains(&item)),
            _ => false,
        },
    }
}

fn contains_ci(haystack: Option<String>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jb_common::PageRequest;

    fn job(title: &str, created_at: &str) -> Value {
        json!({
            "recruiter_id": Uuid::new_v4(),
            "title": title,
            "description": "d",
            "company_name": "c",
            "location": "Berlin",
            "job_type": "full_time",
            "experience_level": "mid",
            "required_skills": ["rust", "sql"],
            "created_at": created_at,
        })
    }

    #[tokio::test]
    async fn test_insert_fills_defaults() {
        let store = MemoryStore::new();
        let row = store.insert(Table::Jobs, job("A", "2024-01-01T00:00:00Z")).await.unwrap();

        assert!(row["id"].is_string());
        assert_eq!(row["is_active"], true);
        assert_eq!(row["applications_count"], 0);
        assert_eq!(row["salary_currency"], "USD");
        // explicit values win over defaults
        assert_eq!(row["created_at"], "2024-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn test_unique_constraint() {
        let store = MemoryStore::new();
        let job_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let row = json!({ "job_id": job_id, "user_id": user_id });

        store.insert(Table::SavedJobs, row.clone()).await.unwrap();
        let err = store.insert(Table::SavedJobs, row).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { ref constraint } if constraint == "saved_jobs_job_id_user_id_key"));
        assert_eq!(store.len(Table::SavedJobs), 1);
    }

    #[tokio::test]
    async fn test_select_filters_order_and_range() {
        let store = MemoryStore::new();
        for i in 0..23 {
            let created = format!("2024-01-{:02}T00:00:00Z", i + 1);
            store.insert(Table::Jobs, job(&format!("Job {}", i), &created)).await.unwrap();
        }

        let page = store
            .select(
                Table::Jobs,
                &Query::new().newest_first("created_at").page(PageRequest::new(3, 10)),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 23);
        assert_eq!(page.rows.len(), 3);
        assert_eq!(page.rows[0]["title"], "Job 2");
        assert_eq!(page.rows[2]["title"], "Job 0");

        let hits = store
            .select(
                Table::Jobs,
                &Query::new()
                    .filter(Filter::AnyILike(vec!["title", "description"], "JOB 1".to_string()))
                    .filter(Filter::Overlaps("required_skills", vec!["go".to_string(), "rust".to_string()])),
            )
            .await
            .unwrap();
        // Job 1 and Job 10..=19
        assert_eq!(hits.total, 11);
    }

    #[tokio::test]
    async fn test_applications_counter_and_cascade() {
        let store = MemoryStore::new();
        let job = store.insert(Table::Jobs, job("A", "2024-01-01T00:00:00Z")).await.unwrap();
        let job_id = job["id"].as_str().unwrap().to_string();

        store
            .insert(
                Table::Applications,
                json!({ "job_id": job_id, "applicant_id": Uuid::new_v4(), "resume_url": "r" }),
            )
            .await
            .unwrap();
        let counted = store
            .select(Table::Jobs, &Query::new().eq("id", &job_id))
            .await
            .unwrap();
        assert_eq!(counted.rows[0]["applications_count"], 1);

        let removed = store.delete(Table::Jobs, &[Filter::eq("id", &job_id)]).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.is_empty(Table::Applications));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        store.fail_writes_to(Table::Notifications);
        let err = store
            .insert(Table::Notifications, json!({ "user_id": Uuid::new_v4() }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        store.restore_writes_to(Table::Notifications);
        store.set_unavailable(true);
        let err = store.count(Table::Jobs, &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
