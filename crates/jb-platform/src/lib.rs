//! JobBoard Platform
//!
//! Core platform providing:
//! - Identity resolution from bearer credentials
//! - Role and ownership access policy
//! - Job listing, application and saved-job workflows
//! - Best-effort in-app notifications
//! - Admin moderation over the elevated store

pub mod domain;
pub mod repository;
pub mod service;
pub mod api;
pub mod error;
pub mod platform;

pub use domain::*;
pub use error::PlatformError;
pub use platform::Platform;
