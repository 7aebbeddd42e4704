//! API Middleware
//!
//! Bearer authentication extractor, per-client rate limiting and
//! security response headers.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json, Router,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::debug;

use crate::api::common::ApiError;
use crate::error::PlatformError;
use crate::service::{extract_bearer_token, AuthContext, IdentityResolver};

/// Shared authentication state, installed as a request extension
#[derive(Clone)]
pub struct AuthState {
    pub resolver: Arc<IdentityResolver>,
}

/// Extractor for authenticated requests
pub struct Authenticated(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = PlatformError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let auth_state = parts
            .extensions
            .get::<AuthState>()
            .ok_or_else(|| PlatformError::internal("AuthState not installed"))?;

        let context = auth_state.resolver.resolve(token).await?;
        Ok(Authenticated(context))
    }
}

/// The raw bearer credential, for sign-out
pub struct BearerToken(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = PlatformError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(parts).map(|t| BearerToken(t.to_string()))
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, PlatformError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| PlatformError::unauthenticated("No authorization token provided"))
}

// ============================================================================
// Rate limiting
// ============================================================================

/// Per-client request budget: `max_requests` per `window`, replenished evenly
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
}

impl RateLimit {
    /// `None` when limiting is disabled (zero window or zero budget)
    pub fn new(max_requests: u32, window: Duration) -> Option<Self> {
        let burst = NonZeroU32::new(max_requests)?;
        let quota = Quota::with_period(window / burst.get())?.allow_burst(burst);
        Some(Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
        })
    }

    pub fn check(&self, client: &str) -> bool {
        self.limiter.check_key(&client.to_string()).is_ok()
    }

    /// Drop state for clients whose budget has fully replenished
    pub fn purge(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }
}

/// Client key: first `x-forwarded-for` hop, else "unknown"
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

pub async fn rate_limit(State(limit): State<RateLimit>, request: Request, next: Next) -> Response {
    let client = client_key(request.headers());
    if !limit.check(&client) {
        debug!(client = %client, "Rate limit exceeded");
        let body = ApiError::new(
            "TOO_MANY_REQUESTS",
            "Too many requests from this IP, please try again later.",
        );
        return (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    }
    next.run(request).await
}

// ============================================================================
// Security headers
// ============================================================================

pub fn with_security_headers(router: Router) -> Router {
    router
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_key() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers), "unknown");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_key(&headers), "203.0.113.7");
    }

    #[test]
    fn test_rate_limit_budget() {
        let limit = RateLimit::new(2, Duration::from_secs(60)).unwrap();
        assert!(limit.check("a"));
        assert!(limit.check("a"));
        assert!(!limit.check("a"));
        assert!(limit.check("b"));
    }

    #[test]
    fn test_rate_limit_disabled() {
        assert!(RateLimit::new(0, Duration::from_secs(60)).is_none());
        assert!(RateLimit::new(100, Duration::ZERO).is_none());
    }
}
