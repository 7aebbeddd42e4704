//! Configuration loading tests

use jb_common::telemetry::LogFormat;
use jb_config::{ConfigError, JobBoardConfig, StoreBackend};
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn write_toml(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_missing_supabase_settings_are_listed() {
    let err = JobBoardConfig::load_with(env_from(&[])).unwrap_err();
    match err {
        ConfigError::Missing(keys) => {
            assert_eq!(keys, vec!["SUPABASE_URL", "SUPABASE_ANON_KEY"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_memory_backend_needs_no_supabase() {
    let config = JobBoardConfig::load_with(env_from(&[("JB_STORE_BACKEND", "memory")])).unwrap();
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert!(config.admin_enabled());
}

#[test]
fn test_env_overrides() {
    let config = JobBoardConfig::load_with(env_from(&[
        ("SUPABASE_URL", "https://demo.supabase.co/"),
        ("SUPABASE_KEY", "anon"),
        ("PORT", "8080"),
        ("DEV_ALLOW_DEV_ROUTES", "true"),
        ("JB_ENFORCE_STATUS_TRANSITIONS", "1"),
        ("JB_LOG_FORMAT", "json"),
        ("JB_RATE_LIMIT_WINDOW_SECS", "0"),
    ]))
    .unwrap();

    assert_eq!(config.server.port, 8080);
    assert!(config.server.dev_routes);
    assert!(config.workflow.enforce_status_transitions);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.server.rate_limit_window_secs, 0);
    // trailing slash is normalized away
    assert_eq!(config.supabase.url.as_deref(), Some("https://demo.supabase.co"));
    assert_eq!(config.supabase.anon_key.as_deref(), Some("anon"));
    assert!(!config.admin_enabled());
}

#[test]
fn test_anon_key_precedence() {
    let config = JobBoardConfig::load_with(env_from(&[
        ("SUPABASE_URL", "https://demo.supabase.co"),
        ("VITE_SUPABASE_ANON_KEY", "vite"),
        ("SUPABASE_ANON_KEY", "primary"),
    ]))
    .unwrap();
    assert_eq!(config.supabase.anon_key.as_deref(), Some("primary"));
}

#[test]
fn test_invalid_values_are_rejected() {
    let err = JobBoardConfig::load_with(env_from(&[
        ("JB_STORE_BACKEND", "memory"),
        ("PORT", "not-a-port"),
    ]))
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));

    let err = JobBoardConfig::load_with(env_from(&[
        ("SUPABASE_URL", "ftp://demo"),
        ("SUPABASE_ANON_KEY", "anon"),
    ]))
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "SUPABASE_URL"));
}

#[test]
fn test_auth_cache_ttl_is_capped() {
    let config = JobBoardConfig::load_with(env_from(&[
        ("JB_STORE_BACKEND", "memory"),
        ("JB_AUTH_CACHE_TTL_SECS", "60"),
    ]))
    .unwrap();
    assert_eq!(config.auth.cache_ttl_secs, 10);
}

#[test]
fn test_toml_file_then_env() {
    let file = write_toml(
        r#"
[server]
port = 4000
rate_limit_max = 50

[supabase]
url = "https://file.supabase.co"
anon_key = "file-anon"
service_role_key = "file-service"

[workflow]
enforce_status_transitions = true
"#,
    );
    let path = file.path().to_string_lossy().to_string();

    let config = JobBoardConfig::load_with(env_from(&[
        ("JB_CONFIG_PATH", path.as_str()),
        ("PORT", "5000"),
    ]))
    .unwrap();

    assert_eq!(config.server.port, 5000);
    assert_eq!(config.server.rate_limit_max, 50);
    assert_eq!(config.server.request_timeout_secs, 30);
    assert_eq!(config.supabase.anon_key.as_deref(), Some("file-anon"));
    assert!(config.workflow.enforce_status_transitions);
    assert!(config.admin_enabled());
}

#[test]
fn test_unreadable_and_malformed_files() {
    let err = JobBoardConfig::load_with(env_from(&[(
        "JB_CONFIG_PATH",
        "/definitely/not/here/jobboard.toml",
    )]))
    .unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));

    let file = write_toml("[server\nport = ");
    let path = file.path().to_string_lossy().to_string();
    let err = JobBoardConfig::load_with(env_from(&[("JB_CONFIG_PATH", path.as_str())])).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
