//! Domain Models
//!
//! Rows exchanged with the data store. Field names match the table columns,
//! so records serialize straight to and from the PostgREST wire format.

pub mod profile;
pub mod job;
pub mod application;
pub mod saved_job;
pub mod notification;

pub use profile::*;
pub use job::*;
pub use application::*;
pub use saved_job::*;
pub use notification::*;

use serde::{Deserialize, Deserializer};

/// Treat an explicit `null` column like a missing one
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn default_true() -> bool {
    true
}

/// Trimmed non-empty check used by create/update validation
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} is required", field))
    } else {
        Ok(())
    }
}
