//! JobBoard Platform Server
//!
//! Production server for the job-board REST API:
//! - Auth, profiles, jobs, applications, saved jobs, notifications
//! - Admin moderation (requires the service role key)
//! - Health and OpenAPI documentation
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PORT` | `3001` | HTTP API port |
//! | `JB_CONFIG_PATH` | `jobboard.toml` | Optional TOML config file |
//! | `JB_STORE_BACKEND` | `supabase` | `supabase` or `memory` |
//! | `SUPABASE_URL` | - | Project URL (required for `supabase`) |
//! | `SUPABASE_ANON_KEY` | - | Restricted key (required for `supabase`) |
//! | `SUPABASE_SERVICE_ROLE_KEY` | - | Elevated key for admin operations |
//! | `JB_LOG_FORMAT` | `pretty` | `pretty` or `json` |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use jb_common::telemetry::init_tracing;
use jb_config::{JobBoardConfig, StoreBackend};
use jb_platform::api::build_router;
use jb_platform::repository::{DataStore, MemoryStore, PostgrestStore};
use jb_platform::service::{IdentityProvider, MemoryIdentityProvider, SupabaseAuthProvider};
use jb_platform::Platform;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

type Backends = (Arc<dyn DataStore>, Option<Arc<dyn DataStore>>, Arc<dyn IdentityProvider>);

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real deployments set the environment directly
    let dotenv = dotenvy::dotenv();

    let config = JobBoardConfig::load().context("Invalid configuration")?;
    init_tracing(config.logging.format);

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }
    info!("Starting JobBoard Platform Server");

    let (store, admin_store, identity) = connect(&config)?;
    let platform = Platform::new(store, admin_store, identity, &config);
    let (app, rate_limit) = build_router(&platform, &config.server);

    // Periodic housekeeping for the identity cache and rate-limit state
    let resolver = platform.resolver.clone();
    let purge_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            resolver.purge_expired();
            if let Some(limit) = &rate_limit {
                limit.purge();
            }
        }
    });

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    purge_task.abort();
    info!("JobBoard Platform Server shutdown complete");
    Ok(())
}

fn connect(config: &JobBoardConfig) -> Result<Backends> {
    match config.store.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory store and identity provider; data is lost on restart");
            let store: Arc<dyn DataStore> = Arc::new(MemoryStore::new());
            Ok((store.clone(), Some(store), Arc::new(MemoryIdentityProvider::new())))
        }
        StoreBackend::Supabase => {
            let supabase = &config.supabase;
            let url = supabase.url.as_deref().context("SUPABASE_URL is not set")?;
            let anon_key = supabase.anon_key.clone().context("SUPABASE_ANON_KEY is not set")?;
            let timeout = Duration::from_secs(supabase.timeout_secs);

            info!(url = %url, "Connecting to Supabase");
            let store: Arc<dyn DataStore> = Arc::new(PostgrestStore::new(url, anon_key.clone(), timeout, "anon")?);

            let admin_store = match &supabase.service_role_key {
                Some(key) => {
                    let admin: Arc<dyn DataStore> =
                        Arc::new(PostgrestStore::new(url, key.clone(), timeout, "service_role")?);
                    Some(admin)
                }
                None => None,
            };

            let identity = SupabaseAuthProvider::new(url, anon_key, supabase.service_role_key.clone(), timeout)?;
            Ok((store, admin_store, Arc::new(identity)))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received...");
}
