//! GoTrue (Supabase Auth) identity provider

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::identity::{IdentityError, IdentityProvider, IdentityUser, Session, SignInOutcome, SignUpOutcome};

/// GoTrue reports errors under several different keys depending on endpoint
#[derive(Debug, Default, Deserialize)]
struct GoTrueErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl GoTrueErrorBody {
    fn into_message(self, status: StatusCode) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .unwrap_or_else(|| status.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(flatten)]
    session: Session,
    user: IdentityUser,
}

pub struct SupabaseAuthProvider {
    client: reqwest::Client,
    auth_url: String,
    anon_key: String,
    service_role_key: Option<String>,
}

impl SupabaseAuthProvider {
    pub fn new(
        base_url: &str,
        anon_key: impl Into<String>,
        service_role_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Backend(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            auth_url: format!("{}/auth/v1", base_url.trim_end_matches('/')),
            anon_key: anon_key.into(),
            service_role_key,
        })
    }

    fn anon(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.auth_url, path))
            .header("apikey", &self.anon_key)
    }

    async fn send(&self, request: RequestBuilder, operation: &str) -> Result<Response, IdentityError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                IdentityError::Unavailable(e.to_string())
            } else {
                IdentityError::Backend(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: GoTrueErrorBody = response.json().await.unwrap_or_default();
        let message = body.into_message(status);
        debug!(operation, status = %status, message = %message, "GoTrue request failed");

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => IdentityError::InvalidCredentials(message),
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                IdentityError::Unavailable(message)
            }
            s if s.is_client_error() => IdentityError::Rejected(message),
            _ => IdentityError::Backend(message),
        })
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuthProvider {
    async fn verify(&self, token: &str) -> Result<IdentityUser, IdentityError> {
        let response = self
            .send(self.anon(reqwest::Method::GET, "/user").bearer_auth(token), "verify")
            .await?;
        response
            .json()
            .await
            .map_err(|e| IdentityError::Backend(format!("Invalid user payload: {}", e)))
    }

    async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> Result<SignUpOutcome, IdentityError> {
        let response = self
            .send(
                self.anon(reqwest::Method::POST, "/signup").json(&json!({
                    "email": email,
                    "password": password,
                    "data": metadata,
                })),
                "sign_up",
            )
            .await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| IdentityError::Backend(format!("Invalid sign-up payload: {}", e)))?;

        // with autoconfirm the body is a session, otherwise it is the bare user
        if body.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(body)
                .map_err(|e| IdentityError::Backend(format!("Invalid session payload: {}", e)))?;
            Ok(SignUpOutcome {
                user: Some(token.user),
                session: Some(token.session),
            })
        } else {
            Ok(SignUpOutcome {
                user: serde_json::from_value(body).ok(),
                session: None,
            })
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, IdentityError> {
        let response = self
            .send(
                self.anon(reqwest::Method::POST, "/token")
                    .query(&[("grant_type", "password")])
                    .json(&json!({ "email": email, "password": password })),
                "sign_in",
            )
            .await
            .map_err(|e| match e {
                // GoTrue answers a bad password with 400 invalid_grant
                IdentityError::Rejected(message) => IdentityError::InvalidCredentials(message),
                other => other,
            })?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Backend(format!("Invalid session payload: {}", e)))?;
        Ok(SignInOutcome {
            user: token.user,
            session: token.session,
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        self.send(
            self.anon(reqwest::Method::POST, "/logout").bearer_auth(token),
            "sign_out",
        )
        .await?;
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        let Some(service_key) = &self.service_role_key else {
            warn!(user_id = %user_id, "Cannot delete identity without a service role key");
            return Err(IdentityError::Backend("Service role key not configured".to_string()));
        };

        self.send(
            self.client
                .delete(format!("{}/admin/users/{}", self.auth_url, user_id))
                .header("apikey", service_key)
                .bearer_auth(service_key),
            "delete_user",
        )
        .await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "gotrue"
    }
}
