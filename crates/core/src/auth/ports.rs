//! Port interfaces for session caching and credential lookup

use async_trait::async_trait;
use storectl_domain::{AuthSession, Credentials, Result};

/// Best-effort store of the latest session per username
///
/// Hits are advisory: a cached session may already be rejected by the
/// server.
#[async_trait]
pub trait AuthCache: Send + Sync {
    /// Look up the session cached for `username`
    ///
    /// `Ok(None)` is a miss. Errors are treated as a miss by callers.
    async fn get(&self, username: &str) -> Result<Option<AuthSession>>;

    /// Record `session` as the latest for `username`
    ///
    /// Failures are logged by callers and never fail authentication.
    async fn put(&self, username: &str, session: &AuthSession) -> Result<()>;
}

/// Source of the credentials used whenever authentication is required
///
/// Called lazily at the moment a session is needed; implementations should
/// read their source each time rather than snapshotting it.
pub trait CredentialsProvider: Send + Sync {
    fn username(&self) -> Result<String>;

    fn password(&self) -> Result<String>;
}

/// Fixed credentials, mostly useful for tests and embedding
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { credentials: Credentials::new(username, password) }
    }
}

impl From<Credentials> for StaticCredentials {
    fn from(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl CredentialsProvider for StaticCredentials {
    fn username(&self) -> Result<String> {
        Ok(self.credentials.username.clone())
    }

    fn password(&self) -> Result<String> {
        Ok(self.credentials.password.clone())
    }
}
