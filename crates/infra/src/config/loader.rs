//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `STORECTL_ENDPOINT`: Control plane base URL (required)
//! - `STORECTL_USERNAME`: Login username (required)
//! - `STORECTL_PASSWORD`: Login password (required)
//! - `STORECTL_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `STORECTL_USER_AGENT`: User-Agent header value
//! - `STORECTL_AUTH_CACHE_TTL_SECS`: Session cache TTL in seconds
//! - `STORECTL_AUTH_CACHE_MAX_CAPACITY`: Session cache capacity
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./storectl.json` or `./storectl.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use storectl_domain::{ApiError, AuthCacheConfig, ClientConfig, Result};

pub const ENV_ENDPOINT: &str = "STORECTL_ENDPOINT";
pub const ENV_USERNAME: &str = "STORECTL_USERNAME";
pub const ENV_PASSWORD: &str = "STORECTL_PASSWORD";
pub const ENV_TIMEOUT_SECS: &str = "STORECTL_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "STORECTL_USER_AGENT";
pub const ENV_AUTH_CACHE_TTL_SECS: &str = "STORECTL_AUTH_CACHE_TTL_SECS";
pub const ENV_AUTH_CACHE_MAX_CAPACITY: &str = "STORECTL_AUTH_CACHE_MAX_CAPACITY";

const CONFIG_FILE_NAMES: [&str; 4] =
    ["storectl.json", "storectl.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `ApiError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!(endpoint = %config.endpoint, "Configuration loaded from environment");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Endpoint, username and password must be present; the remaining
/// variables fall back to their defaults.
///
/// # Errors
/// Returns `ApiError::Config` if required variables are missing,
/// numeric values do not parse or are out of range.
pub fn load_from_env() -> Result<ClientConfig> {
    let defaults = ClientConfig::default();
    let cache_defaults = AuthCacheConfig::default();

    let config = ClientConfig {
        endpoint: env_var(ENV_ENDPOINT)?,
        username: env_var(ENV_USERNAME)?,
        password: env_var(ENV_PASSWORD)?,
        timeout_secs: env_parse(ENV_TIMEOUT_SECS, defaults.timeout_secs)?,
        user_agent: std::env::var(ENV_USER_AGENT).unwrap_or(defaults.user_agent),
        auth_cache: AuthCacheConfig {
            max_capacity: env_parse(ENV_AUTH_CACHE_MAX_CAPACITY, cache_defaults.max_capacity)?,
            ttl_secs: env_parse(ENV_AUTH_CACHE_TTL_SECS, cache_defaults.ttl_secs)?,
        },
    };
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
/// Format is detected by file extension.
///
/// # Errors
/// Returns `ApiError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ApiError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ApiError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ApiError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    let config: ClientConfig = match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ApiError::Config(format!("Invalid TOML format: {}", e)))?,
        "json" => serde_json::from_str(contents)
            .map_err(|e| ApiError::Config(format!("Invalid JSON format: {}", e)))?,
        _ => return Err(ApiError::Config(format!("Unsupported config format: {}", extension))),
    };
    config.validate()?;
    Ok(config)
}

/// Probe the standard locations for a configuration file
///
/// Returns the first existing candidate, or `None`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    first_existing(&dirs)
}

fn first_existing(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get a required environment variable
///
/// Unset and empty are both treated as missing.
pub(crate) fn env_var(key: &str) -> Result<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty()).ok_or_else(|| {
        ApiError::Config(format!("Missing required environment variable: {}", key))
    })
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ApiError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::{NamedTempFile, TempDir};

    use super::*;
    use crate::config::ENV_LOCK;

    const ALL_VARS: [&str; 7] = [
        ENV_ENDPOINT,
        ENV_USERNAME,
        ENV_PASSWORD,
        ENV_TIMEOUT_SECS,
        ENV_USER_AGENT,
        ENV_AUTH_CACHE_TTL_SECS,
        ENV_AUTH_CACHE_MAX_CAPACITY,
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    fn write_with_extension(contents: &str, extension: &str) -> (NamedTempFile, PathBuf) {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        temp_file.write_all(contents.as_bytes()).expect("Failed to write temp file");
        let path = temp_file.path().with_extension(extension);
        std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");
        (temp_file, path)
    }

    #[test]
    fn test_load_from_env_required_only() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var(ENV_ENDPOINT, "http://storage.local:5705/v2");
        std::env::set_var(ENV_USERNAME, "admin");
        std::env::set_var(ENV_PASSWORD, "secret");

        let config = load_from_env().expect("config from env");

        assert_eq!(config.endpoint, "http://storage.local:5705/v2");
        assert_eq!(config.username, "admin");
        assert_eq!(config.password, "secret");
        assert_eq!(config.timeout_secs, ClientConfig::default().timeout_secs);
        assert_eq!(config.auth_cache, AuthCacheConfig::default());

        clear_env();
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var(ENV_ENDPOINT, "https://cp.example.com/v2");
        std::env::set_var(ENV_USERNAME, "ops");
        std::env::set_var(ENV_PASSWORD, "pw");
        std::env::set_var(ENV_TIMEOUT_SECS, "30");
        std::env::set_var(ENV_USER_AGENT, "ops-tool/1.0");
        std::env::set_var(ENV_AUTH_CACHE_TTL_SECS, " 120 ");
        std::env::set_var(ENV_AUTH_CACHE_MAX_CAPACITY, "8");

        let config = load_from_env().expect("config from env");

        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.user_agent, "ops-tool/1.0");
        assert_eq!(config.auth_cache, AuthCacheConfig { max_capacity: 8, ttl_secs: 120 });

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var(ENV_ENDPOINT, "http://localhost");
        std::env::set_var(ENV_USERNAME, "admin");

        let err = load_from_env().unwrap_err();

        assert!(matches!(err, ApiError::Config(ref msg) if msg.contains(ENV_PASSWORD)));
        clear_env();
    }

    #[test]
    fn test_load_from_env_empty_counts_as_missing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var(ENV_ENDPOINT, "http://localhost");
        std::env::set_var(ENV_USERNAME, "");
        std::env::set_var(ENV_PASSWORD, "pw");

        assert!(matches!(load_from_env(), Err(ApiError::Config(_))));
        clear_env();
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var(ENV_ENDPOINT, "http://localhost");
        std::env::set_var(ENV_USERNAME, "admin");
        std::env::set_var(ENV_PASSWORD, "pw");
        std::env::set_var(ENV_TIMEOUT_SECS, "soon");

        let err = load_from_env().unwrap_err();

        assert!(matches!(err, ApiError::Config(ref msg) if msg.contains(ENV_TIMEOUT_SECS)));
        clear_env();
    }

    #[test]
    fn test_load_from_env_rejects_oversized_cache_ttl() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var(ENV_ENDPOINT, "http://localhost");
        std::env::set_var(ENV_USERNAME, "admin");
        std::env::set_var(ENV_PASSWORD, "pw");
        std::env::set_var(ENV_AUTH_CACHE_TTL_SECS, "40000000000");

        let err = load_from_env().unwrap_err();

        assert!(matches!(err, ApiError::Config(ref msg) if msg.contains("ttl_secs")));
        clear_env();
    }

    #[test]
    fn test_parse_config_rejects_oversized_cache_ttl() {
        let contents = "[auth_cache]\nttl_secs = 40000000000\n";
        let err = parse_config(contents, Path::new("storectl.toml")).unwrap_err();
        assert!(matches!(err, ApiError::Config(ref msg) if msg.contains("ttl_secs")));
    }

    #[test]
    fn test_load_from_file_json() {
        let (_temp, path) = write_with_extension(
            r#"{
                "endpoint": "http://10.0.0.5:5705/v2",
                "username": "admin",
                "password": "secret",
                "auth_cache": { "ttl_secs": 60 }
            }"#,
            "json",
        );

        let config = load_from_file(Some(path.clone())).expect("json config");

        assert_eq!(config.endpoint, "http://10.0.0.5:5705/v2");
        assert_eq!(config.auth_cache.ttl_secs, 60);
        assert_eq!(config.auth_cache.max_capacity, AuthCacheConfig::default().max_capacity);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_toml() {
        let (_temp, path) = write_with_extension(
            r#"
                endpoint = "http://10.0.0.6:5705/v2"
                username = "admin"
                password = "secret"
                timeout_secs = 5

                [auth_cache]
                max_capacity = 2
            "#,
            "toml",
        );

        let config = load_from_file(Some(path.clone())).expect("toml config");

        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.auth_cache.max_capacity, 2);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_missing_path() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/storectl.json"))).unwrap_err();
        assert!(matches!(err, ApiError::Config(ref msg) if msg.contains("not found")));
    }

    #[test]
    fn test_parse_config_rejects_unknown_extension() {
        let err = parse_config("endpoint: x", Path::new("storectl.yaml")).unwrap_err();
        assert!(matches!(err, ApiError::Config(ref msg) if msg.contains("yaml")));
    }

    #[test]
    fn test_parse_config_rejects_malformed_json() {
        let err = parse_config("{ not json", Path::new("storectl.json")).unwrap_err();
        assert!(matches!(err, ApiError::Config(ref msg) if msg.contains("JSON")));
    }

    #[test]
    fn test_first_existing_prefers_storectl_name_then_directory_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(first.path().join("config.toml"), "").unwrap();
        std::fs::write(first.path().join("storectl.json"), "{}").unwrap();
        std::fs::write(second.path().join("storectl.json"), "{}").unwrap();

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(first_existing(&dirs), Some(first.path().join("storectl.json")));

        let dirs = vec![TempDir::new().unwrap().path().to_path_buf()];
        assert_eq!(first_existing(&dirs), None);
    }
}
