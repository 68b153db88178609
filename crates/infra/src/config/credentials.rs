//! Credentials sourced from configuration
//!
//! Values are looked up on every call and never cached here, so a rotated
//! environment variable is picked up by the next login.

use storectl_core::CredentialsProvider;
use storectl_domain::{ApiError, ClientConfig, Result};

use super::loader::{env_var, ENV_PASSWORD, ENV_USERNAME};

#[derive(Debug, Clone)]
enum Source {
    Fixed(ClientConfig),
    Environment,
}

/// [`CredentialsProvider`] backed by a `ClientConfig` or the live environment
#[derive(Debug, Clone)]
pub struct ConfigCredentials {
    source: Source,
}

impl ConfigCredentials {
    pub fn from_config(config: ClientConfig) -> Self {
        Self { source: Source::Fixed(config) }
    }

    /// Read `STORECTL_USERNAME` / `STORECTL_PASSWORD` at each lookup
    pub fn from_env() -> Self {
        Self { source: Source::Environment }
    }
}

fn required(value: &str, field: &str) -> Result<String> {
    if value.is_empty() {
        return Err(ApiError::Config(format!("no {field} configured")));
    }
    Ok(value.to_string())
}

impl CredentialsProvider for ConfigCredentials {
    fn username(&self) -> Result<String> {
        match &self.source {
            Source::Fixed(config) => required(&config.username, "username"),
            Source::Environment => env_var(ENV_USERNAME),
        }
    }

    fn password(&self) -> Result<String> {
        match &self.source {
            Source::Fixed(config) => required(&config.password, "password"),
            Source::Environment => env_var(ENV_PASSWORD),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_LOCK;

    #[test]
    fn test_fixed_config_supplies_both_values() {
        let credentials =
            ConfigCredentials::from_config(ClientConfig::new("http://h", "admin", "pw"));

        assert_eq!(credentials.username().unwrap(), "admin");
        assert_eq!(credentials.password().unwrap(), "pw");
    }

    #[test]
    fn test_missing_password_is_a_config_error() {
        let credentials =
            ConfigCredentials::from_config(ClientConfig::new("http://h", "admin", ""));

        assert_eq!(credentials.username().unwrap(), "admin");
        assert!(matches!(credentials.password(), Err(ApiError::Config(_))));
    }

    #[test]
    fn test_environment_is_reread_on_each_call() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        let credentials = ConfigCredentials::from_env();

        std::env::set_var(ENV_USERNAME, "first");
        std::env::set_var(ENV_PASSWORD, "pw-1");
        assert_eq!(credentials.username().unwrap(), "first");

        std::env::set_var(ENV_USERNAME, "second");
        assert_eq!(credentials.username().unwrap(), "second");

        std::env::remove_var(ENV_USERNAME);
        std::env::remove_var(ENV_PASSWORD);
        assert!(matches!(credentials.username(), Err(ApiError::Config(_))));
        assert!(matches!(credentials.password(), Err(ApiError::Config(_))));
    }

    #[test]
    fn test_debug_output_hides_password() {
        let credentials =
            ConfigCredentials::from_config(ClientConfig::new("http://h", "admin", "hunter2"));
        assert!(!format!("{credentials:?}").contains("hunter2"));
    }
}
