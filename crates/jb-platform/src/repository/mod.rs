//! Repository Layer
//!
//! Typed repositories over the generic [`DataStore`] interface, plus the
//! PostgREST and in-memory store implementations.

pub mod store;
pub mod postgrest;
pub mod memory;

pub mod profile;
pub mod job;
pub mod application;
pub mod saved_job;
pub mod notification;

pub use store::{DataStore, Filter, Order, Query, Selection, StoreError, StoreResult, Table};
pub use postgrest::PostgrestStore;
pub use memory::MemoryStore;

pub use profile::{ProfileRepository, ProfileSearch};
pub use job::{JobRepository, JobSearch};
pub use application::ApplicationRepository;
pub use saved_job::SavedJobRepository;
pub use notification::NotificationRepository;

use serde::Serialize;
use serde_json::Value;

/// One page of typed rows with the total match count
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self { items: Vec::new(), total: 0 }
    }
}

/// Encode a patch and stamp `updated_at`
pub(crate) fn touched<P: Serialize>(patch: &P) -> StoreResult<Value> {
    let mut value = store::encode(patch)?;
    if let Value::Object(map) = &mut value {
        map.insert(
            "updated_at".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
    }
    Ok(value)
}
