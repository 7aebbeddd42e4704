//! Service Layer
//!
//! Identity resolution, access policy and the job-board workflows.

pub mod authorization;
pub mod identity;
pub mod gotrue;
pub mod memory_identity;
pub mod notifications;
pub mod jobs;
pub mod applications;
pub mod saved_jobs;
pub mod profiles;
pub mod accounts;
pub mod admin;

pub use authorization::{authorize, checks, Action, AdminGrant, AuthContext};
pub use identity::{
    extract_bearer_token, IdentityError, IdentityProvider, IdentityResolver, IdentityUser, Session,
};
pub use gotrue::SupabaseAuthProvider;
pub use memory_identity::MemoryIdentityProvider;
pub use notifications::{MarkAllReadResult, NotificationList, NotificationService};
pub use jobs::{JobList, JobService};
pub use applications::{ApplicationService, ApplyRequest, JobApplicationList, MyApplicationList};
pub use saved_jobs::{SavedJobList, SavedJobService};
pub use profiles::ProfileService;
pub use accounts::{AccountService, CurrentUser, SignInResult, SignUpRequest, SignUpResult};
pub use admin::{AdminService, AdminStore, PlatformStats, UserList};
