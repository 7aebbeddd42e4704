//! JobBoard configuration
//!
//! Resolution order:
//! 1. optional TOML file (`JB_CONFIG_PATH`, else `jobboard.toml` when present)
//! 2. environment variable overrides
//! 3. validation

use jb_common::telemetry::LogFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_FILE: &str = "jobboard.toml";

/// Upper bound for the identity cache TTL in seconds
pub const MAX_AUTH_CACHE_TTL_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {}", .0.join(", "))]
    Missing(Vec<String>),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub request_timeout_secs: u64,
    /// Requests allowed per client within one window
    pub rate_limit_max: u32,
    /// Rate-limit window; 0 disables limiting
    pub rate_limit_window_secs: u64,
    pub dev_routes: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            request_timeout_secs: 30,
            rate_limit_max: 100,
            rate_limit_window_secs: 900,
            dev_routes: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Supabase,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "supabase" | "postgrest" => Ok(Self::Supabase),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::InvalidValue {
                key: "JB_STORE_BACKEND".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub service_role_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            service_role_key: None,
            timeout_secs: 10,
        }
    }
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &redact(&self.anon_key))
            .field("service_role_key", &redact(&self.service_role_key))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Identity cache TTL; 0 disables the cache
    pub cache_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { cache_ttl_secs: 5 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Restrict status updates to the documented lifecycle graph
    pub enforce_status_transitions: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

// ============================================================================
// Root
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobBoardConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub supabase: SupabaseConfig,
    pub auth: AuthConfig,
    pub workflow: WorkflowConfig,
    pub logging: LoggingConfig,
}

impl JobBoardConfig {
    /// Load from the process environment
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load with an explicit environment lookup
    pub fn load_with<F>(env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match config_path(&env) {
            Some(path) => {
                debug!(path = %path.display(), "Loading config file");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env(&env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay environment variables onto the current values
    pub fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PORT") {
            self.server.port = parse_value("PORT", &v)?;
        }
        if let Some(v) = get("JB_REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs = parse_value("JB_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("JB_RATE_LIMIT_MAX") {
            self.server.rate_limit_max = parse_value("JB_RATE_LIMIT_MAX", &v)?;
        }
        if let Some(v) = get("JB_RATE_LIMIT_WINDOW_SECS") {
            self.server.rate_limit_window_secs = parse_value("JB_RATE_LIMIT_WINDOW_SECS", &v)?;
        }
        if let Some(v) = get("DEV_ALLOW_DEV_ROUTES") {
            self.server.dev_routes = parse_bool("DEV_ALLOW_DEV_ROUTES", &v)?;
        }
        if let Some(v) = get("JB_STORE_BACKEND") {
            self.store.backend = v.parse()?;
        }
        if let Some(v) = get("SUPABASE_URL") {
            self.supabase.url = Some(v);
        }
        if let Some(v) = get("SUPABASE_ANON_KEY")
            .or_else(|| get("SUPABASE_KEY"))
            .or_else(|| get("VITE_SUPABASE_ANON_KEY"))
        {
            self.supabase.anon_key = Some(v);
        }
        if let Some(v) = get("SUPABASE_SERVICE_ROLE_KEY") {
            self.supabase.service_role_key = Some(v);
        }
        if let Some(v) = get("JB_STORE_TIMEOUT_SECS") {
            self.supabase.timeout_secs = parse_value("JB_STORE_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("JB_AUTH_CACHE_TTL_SECS") {
            self.auth.cache_ttl_secs = parse_value("JB_AUTH_CACHE_TTL_SECS", &v)?;
        }
        if let Some(v) = get("JB_ENFORCE_STATUS_TRANSITIONS") {
            self.workflow.enforce_status_transitions =
                parse_bool("JB_ENFORCE_STATUS_TRANSITIONS", &v)?;
        }
        if let Some(v) = get("JB_LOG_FORMAT") {
            self.logging.format = v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "JB_LOG_FORMAT".to_string(),
                value: v.clone(),
            })?;
        }
        Ok(())
    }

    /// Check required values and normalize bounded ones
    pub fn validate(&mut self) -> Result<()> {
        if self.store.backend == StoreBackend::Supabase {
            let mut missing = Vec::new();
            if self.supabase.url.is_none() {
                missing.push("SUPABASE_URL".to_string());
            }
            if self.supabase.anon_key.is_none() {
                missing.push("SUPABASE_ANON_KEY".to_string());
            }
            if !missing.is_empty() {
                return Err(ConfigError::Missing(missing));
            }
        }

        if let Some(url) = &self.supabase.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    key: "SUPABASE_URL".to_string(),
                    value: url.clone(),
                });
            }
            self.supabase.url = Some(url.trim_end_matches('/').to_string());
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "JB_REQUEST_TIMEOUT_SECS".to_string(),
                value: "0".to_string(),
            });
        }
        if self.supabase.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "JB_STORE_TIMEOUT_SECS".to_string(),
                value: "0".to_string(),
            });
        }
        if self.server.rate_limit_window_secs > 0 && self.server.rate_limit_max == 0 {
            return Err(ConfigError::InvalidValue {
                key: "JB_RATE_LIMIT_MAX".to_string(),
                value: "0".to_string(),
            });
        }

        if self.auth.cache_ttl_secs > MAX_AUTH_CACHE_TTL_SECS {
            warn!(
                requested = self.auth.cache_ttl_secs,
                max = MAX_AUTH_CACHE_TTL_SECS,
                "Identity cache TTL capped"
            );
            self.auth.cache_ttl_secs = MAX_AUTH_CACHE_TTL_SECS;
        }

        if self.store.backend == StoreBackend::Supabase
            && self.supabase.service_role_key.is_none()
        {
            warn!("SUPABASE_SERVICE_ROLE_KEY not set, admin operations are disabled");
        }

        Ok(())
    }

    pub fn admin_enabled(&self) -> bool {
        self.store.backend == StoreBackend::Memory || self.supabase.service_role_key.is_some()
    }
}

fn config_path<F>(env: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    match env("JB_CONFIG_PATH").filter(|v| !v.trim().is_empty()) {
        Some(explicit) => Some(PathBuf::from(explicit)),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
