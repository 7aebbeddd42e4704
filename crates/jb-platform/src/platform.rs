//! Service wiring
//!
//! Builds every repository and workflow service from the injected store and
//! identity provider. Nothing here is a process-wide singleton.

use std::sync::Arc;
use std::time::Duration;

use jb_config::JobBoardConfig;
use tracing::{info, warn};

use crate::domain::StatusTransitionPolicy;
use crate::repository::{
    ApplicationRepository, DataStore, JobRepository, NotificationRepository, ProfileRepository,
    SavedJobRepository,
};
use crate::service::{
    AccountService, AdminService, AdminStore, ApplicationService, IdentityProvider, IdentityResolver,
    JobService, NotificationService, ProfileService, SavedJobService,
};

pub struct Platform {
    pub resolver: Arc<IdentityResolver>,
    pub profile_repo: Arc<ProfileRepository>,
    pub accounts: Arc<AccountService>,
    pub profiles: Arc<ProfileService>,
    pub jobs: Arc<JobService>,
    pub applications: Arc<ApplicationService>,
    pub saved_jobs: Arc<SavedJobService>,
    pub notifications: Arc<NotificationService>,
    pub admin: Arc<AdminService>,
}

impl Platform {
    /// `admin_store` is the service-role connection; without it admin
    /// operations report a configuration error.
    pub fn new(
        store: Arc<dyn DataStore>,
        admin_store: Option<Arc<dyn DataStore>>,
        identity: Arc<dyn IdentityProvider>,
        config: &JobBoardConfig,
    ) -> Self {
        let profile_repo = Arc::new(ProfileRepository::new(store.clone()));
        let job_repo = Arc::new(JobRepository::new(store.clone()));
        let application_repo = Arc::new(ApplicationRepository::new(store.clone()));
        let saved_job_repo = Arc::new(SavedJobRepository::new(store.clone()));
        let notification_repo = Arc::new(NotificationRepository::new(store.clone()));

        let resolver = Arc::new(IdentityResolver::new(
            identity.clone(),
            profile_repo.clone(),
            Duration::from_secs(config.auth.cache_ttl_secs),
        ));

        let transitions = StatusTransitionPolicy::from_enforce_flag(config.workflow.enforce_status_transitions);
        let notifications = Arc::new(NotificationService::new(notification_repo));

        if admin_store.is_none() {
            warn!("No service role store configured; admin operations are disabled");
        }

        info!(
            store = store.name(),
            identity = identity.name(),
            transitions = ?transitions,
            "Platform services initialized"
        );

        Self {
            accounts: Arc::new(AccountService::new(resolver.clone(), profile_repo.clone())),
            profiles: Arc::new(ProfileService::new(profile_repo.clone())),
            jobs: Arc::new(JobService::new(job_repo.clone(), profile_repo.clone())),
            applications: Arc::new(ApplicationService::new(
                application_repo,
                job_repo.clone(),
                profile_repo.clone(),
                notifications.clone(),
                transitions,
            )),
            saved_jobs: Arc::new(SavedJobService::new(saved_job_repo, job_repo)),
            admin: Arc::new(AdminService::new(
                admin_store.map(AdminStore::new),
                resolver.clone(),
            )),
            notifications,
            resolver,
            profile_repo,
        }
    }
}
