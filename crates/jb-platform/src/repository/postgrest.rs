//! PostgREST (Supabase REST) adapter
//!
//! Translates [`Query`] values into PostgREST query strings and maps its
//! error payloads onto [`StoreError`]. One instance is created per API key:
//! the anon key for user-scoped requests, the service-role key for admin.

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::store::{DataStore, Filter, Query, Selection, StoreError, StoreResult, Table};

const UNIQUE_VIOLATION: &str = "23505";

/// Error body returned by PostgREST
#[derive(Debug, Default, Deserialize)]
struct PostgrestErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

pub struct PostgrestStore {
    client: reqwest::Client,
    rest_url: String,
    api_key: String,
    label: &'static str,
}

impl PostgrestStore {
    /// `base_url` is the project URL; the adapter appends `/rest/v1`
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
        label: &'static str,
    ) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Backend(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            label,
        })
    }

    fn request(&self, method: Method, table: Table) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.rest_url, table.name()))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: PostgrestErrorBody = serde_json::from_str(&body).unwrap_or_default();
        warn!(
            store = self.label,
            status = %status,
            code = parsed.code.as_deref().unwrap_or(""),
            "PostgREST request failed"
        );
        Err(map_error_response(status, parsed, body))
    }

    async fn rows(response: Response) -> StoreResult<Vec<Value>> {
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<Value>(&body)? {
            Value::Array(rows) => Ok(rows),
            Value::Object(row) => Ok(vec![Value::Object(row)]),
            other => Err(StoreError::Decode(format!("Unexpected response body: {}", other))),
        }
    }
}

#[async_trait]
impl DataStore for PostgrestStore {
    async fn select(&self, table: Table, query: &Query) -> StoreResult<Selection> {
        let params = encode_query(query);
        debug!(store = self.label, table = %table, ?params, "select");

        let response = self
            .send(
                self.request(Method::GET, table)
                    .header("Prefer", "count=exact")
                    .query(&params),
            )
            .await?;

        let total = content_range_total(response.headers());
        let rows = Self::rows(response).await?;
        let total = total.unwrap_or(rows.len() as u64);
        Ok(Selection { rows, total })
    }

    async fn count(&self, table: Table, filters: &[Filter]) -> StoreResult<u64> {
        let mut params = vec![("select".to_string(), "id".to_string())];
        params.extend(filters.iter().map(encode_filter));

        let response = self
            .send(
                self.request(Method::HEAD, table)
                    .header("Prefer", "count=exact")
                    .query(&params),
            )
            .await?;

        content_range_total(response.headers())
            .ok_or_else(|| StoreError::Decode("Missing Content-Range header".to_string()))
    }

    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value> {
        debug!(store = self.label, table = %table, "insert");
        let response = self
            .send(
                self.request(Method::POST, table)
                    .header("Prefer", "return=representation")
                    .json(&row),
            )
            .await?;

        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("Insert returned no row".to_string()))
    }

    async fn update(&self, table: Table, filters: &[Filter], patch: Value) -> StoreResult<Vec<Value>> {
        let params: Vec<(String, String)> = filters.iter().map(encode_filter).collect();
        debug!(store = self.label, table = %table, ?params, "update");

        let response = self
            .send(
                self.request(Method::PATCH, table)
                    .header("Prefer", "return=representation")
                    .query(&params)
                    .json(&patch),
            )
            .await?;
        Self::rows(response).await
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> StoreResult<u64> {
        let params: Vec<(String, String)> = filters.iter().map(encode_filter).collect();
        debug!(store = self.label, table = %table, ?params, "delete");

        let response = self
            .send(
                self.request(Method::DELETE, table)
                    .header("Prefer", "return=representation")
                    .query(&params),
            )
            .await?;
        Ok(Self::rows(response).await?.len() as u64)
    }

    fn name(&self) -> &'static str {
        self.label
    }
}

// ============================================================================
// Query encoding
// ============================================================================

pub fn encode_query(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(query.filters.iter().map(encode_filter));

    if let Some(order) = &query.order {
        let direction = if order.descending { "desc" } else { "asc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }
    if let Some((from, to)) = query.range {
        params.push(("offset".to_string(), from.to_string()));
        params.push(("limit".to_string(), (to.saturating_sub(from) + 1).to_string()));
    }
    params
}

pub fn encode_filter(filter: &Filter) -> (String, String) {
    match filter {
        Filter::Eq(column, value) => (column.to_string(), format!("eq.{}", value)),
        Filter::In(column, values) => {
            let list: Vec<String> = values.iter().map(|v| quote(v)).collect();
            (column.to_string(), format!("in.({})", list.join(",")))
        }
        Filter::ILike(column, needle) => (column.to_string(), format!("ilike.*{}*", needle)),
        Filter::AnyILike(columns, needle) => {
            let pattern = quote(&format!("*{}*", needle));
            let parts: Vec<String> = columns
                .iter()
                .map(|c| format!("{}.ilike.{}", c, pattern))
                .collect();
            ("or".to_string(), format!("({})", parts.join(",")))
        }
        Filter::Overlaps(column, values) => {
            let list: Vec<String> = values.iter().map(|v| quote(v)).collect();
            (column.to_string(), format!("ov.{{{}}}", list.join(",")))
        }
    }
}

/// Double-quote a value when it contains PostgREST list or grouping syntax
fn quote(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| matches!(c, ',' | '.' | ':' | '(' | ')' | '{' | '}' | '"' | '\\') || c.is_whitespace());
    if !needs_quotes {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// `Content-Range: 0-9/23` or `*/0`
fn content_range_total(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("content-range")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit('/').next())
        .and_then(|total| total.parse().ok())
}

// ============================================================================
// Error mapping
// ============================================================================

fn map_transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() || err.is_connect() {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Backend(err.to_string())
    }
}

fn map_error_response(status: StatusCode, body: PostgrestErrorBody, raw: String) -> StoreError {
    let message = body.message.clone().unwrap_or_else(|| {
        if raw.is_empty() {
            status.to_string()
        } else {
            raw
        }
    });

    if body.code.as_deref() == Some(UNIQUE_VIOLATION) {
        return StoreError::UniqueViolation {
            constraint: body.details.unwrap_or(message),
        };
    }

    match status {
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            StoreError::Unavailable(message)
        }
        s if s.is_client_error() => StoreError::Rejected {
            code: body.code,
            message,
        },
        _ => StoreError::Backend(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jb_common::PageRequest;

    #[test]
    fn test_encode_job_search() {
        let query = Query::new()
            .eq("is_active", true)
            .filter(Filter::AnyILike(
                vec!["title", "description", "company_name"],
                "rust".to_string(),
            ))
            .filter(Filter::ILike("location", "Berlin".to_string()))
            .filter(Filter::Overlaps(
                "required_skills",
                vec!["rust".to_string(), "node js".to_string()],
            ))
            .newest_first("created_at")
            .page(PageRequest::new(2, 10));

        let params = encode_query(&query);
        let get = |k: &str| {
            params
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("select"), Some("*"));
        assert_eq!(get("is_active"), Some("eq.true"));
        assert_eq!(
            get("or"),
            Some("(title.ilike.*rust*,description.ilike.*rust*,company_name.ilike.*rust*)")
        );
        assert_eq!(get("location"), Some("ilike.*Berlin*"));
        assert_eq!(get("required_skills"), Some("ov.{rust,\"node js\"}"));
        assert_eq!(get("order"), Some("created_at.desc"));
        assert_eq!(get("offset"), Some("10"));
        assert_eq!(get("limit"), Some("10"));
    }

    #[test]
    fn test_quote_escapes_reserved_characters() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("a,b"), "\"a,b\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(
            encode_filter(&Filter::In("id", vec!["a".into(), "b.c".into()])).1,
            "in.(a,\"b.c\")"
        );
    }

    #[test]
    fn test_error_mapping() {
        let unique = PostgrestErrorBody {
            code: Some("23505".to_string()),
            message: Some("duplicate key value violates unique constraint".to_string()),
            details: Some("Key (job_id, applicant_id) already exists.".to_string()),
        };
        assert!(matches!(
            map_error_response(StatusCode::CONFLICT, unique, String::new()),
            StoreError::UniqueViolation { .. }
        ));

        let rejected = PostgrestErrorBody {
            code: Some("22P02".to_string()),
            message: Some("invalid input syntax for type uuid".to_string()),
            details: None,
        };
        match map_error_response(StatusCode::BAD_REQUEST, rejected, String::new()) {
            StoreError::Rejected { code, message } => {
                assert_eq!(code.as_deref(), Some("22P02"));
                assert!(message.contains("uuid"));
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            map_error_response(StatusCode::SERVICE_UNAVAILABLE, Default::default(), String::new()),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            map_error_response(StatusCode::INTERNAL_SERVER_ERROR, Default::default(), "boom".into()),
            StoreError::Backend(ref m) if m == "boom"
        ));
    }

    #[test]
    fn test_content_range_total() {
        let mut headers = HeaderMap::new();
        headers.insert("content-range", "0-9/23".parse().unwrap());
        assert_eq!(content_range_total(&headers), Some(23));

        headers.insert("content-range", "*/0".parse().unwrap());
        assert_eq!(content_range_total(&headers), Some(0));

        headers.insert("content-range", "0-9/*".parse().unwrap());
        assert_eq!(content_range_total(&headers), None);
    }
}
