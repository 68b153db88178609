//! Client configuration

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AUTH_CACHE_CAPACITY, DEFAULT_AUTH_CACHE_TTL_SECS, DEFAULT_ENDPOINT,
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, MAX_AUTH_CACHE_TTL_SECS, REDACTED,
};
use crate::errors::{ApiError, Result};

/// Connection and credential settings for one control plane
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub auth_cache: AuthCacheConfig,
}

/// Sizing of the in-memory session cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl ClientConfig {
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject values the client stack cannot run with
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        self.auth_cache.validate()
    }
}

impl AuthCacheConfig {
    /// Entry TTL, capped at [`MAX_AUTH_CACHE_TTL_SECS`]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs.min(MAX_AUTH_CACHE_TTL_SECS))
    }

    /// # Errors
    ///
    /// Returns `ApiError::Config` if `ttl_secs` exceeds
    /// [`MAX_AUTH_CACHE_TTL_SECS`].
    pub fn validate(&self) -> Result<()> {
        if self.ttl_secs > MAX_AUTH_CACHE_TTL_SECS {
            return Err(ApiError::Config(format!(
                "auth_cache.ttl_secs must be at most {MAX_AUTH_CACHE_TTL_SECS}, got {}",
                self.ttl_secs
            )));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            username: String::new(),
            password: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
            auth_cache: AuthCacheConfig::default(),
        }
    }
}

impl Default for AuthCacheConfig {
    fn default() -> Self {
        Self { max_capacity: DEFAULT_AUTH_CACHE_CAPACITY, ttl_secs: DEFAULT_AUTH_CACHE_TTL_SECS }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("auth_cache", &self.auth_cache)
            .finish()
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_cache_capacity() -> u64 {
    DEFAULT_AUTH_CACHE_CAPACITY
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_AUTH_CACHE_TTL_SECS
}
