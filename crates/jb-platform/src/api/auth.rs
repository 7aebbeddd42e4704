//! Auth API
//!
//! Sign-up, sign-in and sign-out over the identity provider.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use jb_common::UserRole;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::common::{ApiResult, MessageResponse, ValidJson};
use crate::api::middleware::{Authenticated, BearerToken};
use crate::error::PlatformError;
use crate::service::{AccountService, CurrentUser, SignInResult, SignUpRequest, SignUpResult};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpBody {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInBody {
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct AuthApiState {
    pub accounts: Arc<AccountService>,
}

/// Create an account and its profile
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body = SignUpBody,
    responses(
        (status = 201, description = "Account created", body = SignUpResult),
        (status = 400, description = "Invalid input or email already registered")
    )
)]
pub async fn sign_up(
    State(state): State<AuthApiState>,
    ValidJson(body): ValidJson<SignUpBody>,
) -> Result<(StatusCode, Json<SignUpResult>), PlatformError> {
    let result = state
        .accounts
        .sign_up(SignUpRequest {
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            role: body.role,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Password sign-in
#[utoipa::path(
    post,
    path = "/api/auth/signin",
    tag = "auth",
    request_body = SignInBody,
    responses(
        (status = 200, description = "Signed in", body = SignInResult),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn sign_in(
    State(state): State<AuthApiState>,
    ValidJson(body): ValidJson<SignInBody>,
) -> ApiResult<SignInResult> {
    Ok(Json(state.accounts.sign_in(&body.email, &body.password).await?))
}

/// Revoke the current session
#[utoipa::path(
    post,
    path = "/api/auth/signout",
    tag = "auth",
    responses(
        (status = 200, description = "Signed out", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn sign_out(
    State(state): State<AuthApiState>,
    _auth: Authenticated,
    BearerToken(token): BearerToken,
) -> ApiResult<MessageResponse> {
    state.accounts.sign_out(&token).await?;
    Ok(Json(MessageResponse::new("Signed out successfully")))
}

/// The caller's identity and profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = CurrentUser),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<AuthApiState>,
    Authenticated(auth): Authenticated,
) -> ApiResult<CurrentUser> {
    Ok(Json(state.accounts.me(&auth).await?))
}

pub fn auth_router(state: AuthApiState) -> Router {
    Router::new()
        .route("/signup", post(sign_up))
        .route("/signin", post(sign_in))
        .route("/signout", post(sign_out))
        .route("/me", get(me))
        .with_state(state)
}
