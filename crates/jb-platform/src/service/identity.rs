//! Identity Resolver
//!
//! Turns a bearer credential into an [`AuthContext`]: the identity provider
//! vouches for `{id, email}`, the profile row supplies the role.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{PlatformError, Result};
use crate::repository::ProfileRepository;
use crate::service::authorization::AuthContext;

/// User record as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IdentityUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub user_metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Sign-up result; the session is absent when the provider requires
/// email confirmation first
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: Option<IdentityUser>,
    pub session: Option<Session>,
}

#[derive(Debug, Clone)]
pub struct SignInOutcome {
    pub user: IdentityUser,
    pub session: Session,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    /// Bad credential, unknown token, expired session
    #[error("{0}")]
    InvalidCredentials(String),

    /// The provider refused the request because of its content
    #[error("{0}")]
    Rejected(String),

    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("Identity provider error: {0}")]
    Backend(String),
}

impl From<IdentityError> for PlatformError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials(message) => PlatformError::unauthenticated(message),
            IdentityError::Rejected(message) => PlatformError::Upstream {
                message,
                client_fault: true,
            },
            IdentityError::Unavailable(message) => PlatformError::Unavailable { message },
            IdentityError::Backend(message) => PlatformError::Upstream {
                message,
                client_fault: false,
            },
        }
    }
}

/// External identity collaborator (GoTrue in production)
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, token: &str) -> std::result::Result<IdentityUser, IdentityError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> std::result::Result<SignUpOutcome, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> std::result::Result<SignInOutcome, IdentityError>;

    async fn sign_out(&self, token: &str) -> std::result::Result<(), IdentityError>;

    /// Remove the identity record; needs the elevated key
    async fn delete_user(&self, user_id: Uuid) -> std::result::Result<(), IdentityError>;

    fn name(&self) -> &'static str;
}

/// Extract the credential from an `Authorization: Bearer <token>` header
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

struct CachedIdentity {
    context: AuthContext,
    cached_at: Instant,
}

pub struct IdentityResolver {
    provider: Arc<dyn IdentityProvider>,
    profiles: Arc<ProfileRepository>,
    cache: DashMap<String, CachedIdentity>,
    cache_ttl: Duration,
}

impl IdentityResolver {
    /// A zero `cache_ttl` disables caching
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        profiles: Arc<ProfileRepository>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            profiles,
            cache: DashMap::new(),
            cache_ttl,
        }
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Invalid credential: Unauthenticated. Missing or disabled profile: Forbidden.
    pub async fn resolve(&self, token: &str) -> Result<AuthContext> {
        let key = credential_key(token);
        if let Some(context) = self.cached(&key) {
            return Ok(context);
        }

        let user = self.provider.verify(token).await.map_err(|e| match e {
            IdentityError::InvalidCredentials(_) | IdentityError::Rejected(_) => {
                PlatformError::unauthenticated("Invalid or expired token")
            }
            other => other.into(),
        })?;

        let profile = self
            .profiles
            .find_by_id(user.id)
            .await?
            .ok_or_else(|| PlatformError::forbidden("Profile not found"))?;

        if !profile.is_active {
            debug!(user_id = %user.id, "Rejected request from deactivated account");
            return Err(PlatformError::forbidden("Account is deactivated"));
        }

        let context = AuthContext::new(user.id, user.email, profile.role);
        if !self.cache_ttl.is_zero() {
            self.cache.insert(
                key,
                CachedIdentity {
                    context: context.clone(),
                    cached_at: Instant::now(),
                },
            );
        }
        Ok(context)
    }

    /// Drop any cached identity for this credential
    pub fn invalidate(&self, token: &str) {
        self.cache.remove(&credential_key(token));
    }

    /// Drop cached identities belonging to a user (after role or status changes)
    pub fn invalidate_user(&self, user_id: Uuid) {
        self.cache.retain(|_, entry| entry.context.user_id != user_id);
    }

    fn cached(&self, key: &str) -> Option<AuthContext> {
        if self.cache_ttl.is_zero() {
            return None;
        }
        let fresh = {
            let entry = self.cache.get(key)?;
            if entry.cached_at.elapsed() < self.cache_ttl {
                Some(entry.context.clone())
            } else {
                None
            }
        };
        if fresh.is_none() {
            self.cache.remove(key);
        }
        fresh
    }

    /// Remove expired entries; called periodically by the server
    pub fn purge_expired(&self) {
        let ttl = self.cache_ttl;
        let before = self.cache.len();
        self.cache.retain(|_, entry| entry.cached_at.elapsed() < ttl);
        let purged = before.saturating_sub(self.cache.len());
        if purged > 0 {
            debug!(purged, "Purged expired identity cache entries");
        }
    }
}

/// Cache key: hex SHA-256 of the credential, never the credential itself
fn credential_key(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Log and swallow an identity-side failure that must not fail the caller
pub(crate) fn log_identity_failure(operation: &str, err: &IdentityError) {
    warn!(operation, error = %err, "Identity provider call failed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer   "), None);
        assert_eq!(extract_bearer_token("Basic dXNlcg=="), None);
        assert_eq!(extract_bearer_token("bearer abc"), None);
    }

    #[test]
    fn test_credential_key_is_hashed() {
        let key = credential_key("secret-token");
        assert_eq!(key.len(), 64);
        assert!(!key.contains("secret"));
        assert_eq!(key, credential_key("secret-token"));
    }

    #[test]
    fn test_identity_error_mapping() {
        let err: PlatformError = IdentityError::InvalidCredentials("Invalid login credentials".into()).into();
        assert!(matches!(err, PlatformError::Unauthenticated { .. }));

        let err: PlatformError = IdentityError::Rejected("User already registered".into()).into();
        assert!(matches!(err, PlatformError::Upstream { client_fault: true, .. }));
    }
}
