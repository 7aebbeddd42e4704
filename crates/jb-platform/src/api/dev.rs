//! Development-only routes, mounted only when enabled in configuration

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use jb_common::PageRequest;
use tracing::warn;

use crate::api::common::ApiResult;
use crate::domain::Profile;
use crate::repository::{ProfileRepository, ProfileSearch};

const DEV_PROFILE_LIMIT: u32 = 100;

#[derive(Clone)]
pub struct DevState {
    pub profiles: Arc<ProfileRepository>,
}

/// Unauthenticated profile dump for local debugging
pub async fn list_profiles(State(state): State<DevState>) -> ApiResult<Vec<Profile>> {
    let page = state
        .profiles
        .search(&ProfileSearch::default(), PageRequest::new(1, DEV_PROFILE_LIMIT))
        .await?;
    Ok(Json(page.items))
}

pub fn dev_router(state: DevState) -> Router {
    warn!("Development routes enabled; do not use in production");
    Router::new()
        .route("/profiles", get(list_profiles))
        .with_state(state)
}
