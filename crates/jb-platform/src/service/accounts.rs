//! Account sign-up, sign-in, sign-out and "me"

use std::sync::{Arc, OnceLock};

use jb_common::UserRole;
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::{NewProfile, Profile};
use crate::error::{PlatformError, Result};
use crate::repository::ProfileRepository;
use crate::service::authorization::AuthContext;
use crate::service::identity::{IdentityResolver, IdentityUser, Session};

pub const MIN_PASSWORD_LENGTH: usize = 6;

static EMAIL_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(email))
}

/// Validated sign-up input
#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SignUpResult {
    pub user: Option<IdentityUser>,
    pub session: Option<Session>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SignInResult {
    pub user: IdentityUser,
    pub session: Session,
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentUser {
    pub user: AuthContext,
    pub profile: Profile,
}

pub struct AccountService {
    resolver: Arc<IdentityResolver>,
    profiles: Arc<ProfileRepository>,
}

impl AccountService {
    pub fn new(resolver: Arc<IdentityResolver>, profiles: Arc<ProfileRepository>) -> Self {
        Self { resolver, profiles }
    }

    pub async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpResult> {
        let email = request.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(PlatformError::validation("A valid email is required"));
        }
        if request.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(PlatformError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        let full_name = request.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(PlatformError::validation("Full name is required"));
        }
        let role = request.role.unwrap_or_default();
        if role == UserRole::Admin {
            return Err(PlatformError::validation("Role must be job_seeker or recruiter"));
        }

        let outcome = self
            .resolver
            .provider()
            .sign_up(
                &email,
                &request.password,
                json!({ "full_name": full_name, "role": role }),
            )
            .await?;

        if let Some(user) = &outcome.user {
            let profile = NewProfile::new(user.id, &email, &full_name, role);
            match self.profiles.insert(&profile).await {
                Ok(_) => info!(user_id = %user.id, role = %role, "Account created"),
                Err(e) => warn!(user_id = %user.id, error = %e, "Failed to create profile for new account"),
            }
        }

        Ok(SignUpResult {
            user: outcome.user,
            session: outcome.session,
            message: "Account created successfully".to_string(),
        })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResult> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(PlatformError::validation("Email and password are required"));
        }

        let outcome = self.resolver.provider().sign_in(&email, password).await?;
        let profile = self.profiles.find_by_id(outcome.user.id).await?;

        Ok(SignInResult {
            user: outcome.user,
            session: outcome.session,
            profile,
        })
    }

    /// Revoke the session and drop it from the resolver cache
    pub async fn sign_out(&self, token: &str) -> Result<()> {
        self.resolver.invalidate(token);
        self.resolver.provider().sign_out(token).await?;
        Ok(())
    }

    pub async fn me(&self, actor: &AuthContext) -> Result<CurrentUser> {
        let profile = self
            .profiles
            .find_by_id(actor.user_id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Profile", actor.user_id))?;
        Ok(CurrentUser {
            user: actor.clone(),
            profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.io"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada example@x.com"));
        assert!(!is_valid_email(""));
    }
}
