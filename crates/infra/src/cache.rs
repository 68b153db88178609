//! Session caching with moka
//!
//! Process-local [`AuthCache`] keyed by username. Entries carry the capped TTL
//! from [`AuthCacheConfig::ttl`]; independently of that TTL, a session whose own
//! `expires_at` has passed is treated as a miss and evicted on read.

use async_trait::async_trait;
use moka::future::Cache;
use storectl_core::AuthCache;
use storectl_domain::{AuthCacheConfig, AuthSession, Result};
use tracing::debug;

pub struct MemoryAuthCache {
    sessions: Cache<String, AuthSession>,
}

impl MemoryAuthCache {
    pub fn new(config: &AuthCacheConfig) -> Self {
        tracing::info!(
            ttl_seconds = config.ttl_secs,
            max_capacity = config.max_capacity,
            "auth cache configuration loaded"
        );

        let sessions =
            Cache::builder().max_capacity(config.max_capacity).time_to_live(config.ttl()).build();
        Self { sessions }
    }
}

impl Default for MemoryAuthCache {
    fn default() -> Self {
        Self::new(&AuthCacheConfig::default())
    }
}

#[async_trait]
impl AuthCache for MemoryAuthCache {
    async fn get(&self, username: &str) -> Result<Option<AuthSession>> {
        match self.sessions.get(username).await {
            Some(session) if session.is_expired() => {
                debug!(username, expired_at = %session.expires_at(), "evicting expired session");
                self.sessions.invalidate(username).await;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn put(&self, username: &str, session: &AuthSession) -> Result<()> {
        self.sessions.insert(username.to_string(), session.clone()).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn session(token: &str, ttl: Duration) -> AuthSession {
        AuthSession::new(token, Utc::now() + ttl)
    }

    #[tokio::test]
    async fn test_put_then_get_returns_session() {
        let cache = MemoryAuthCache::default();
        let stored = session("t-1", Duration::hours(1));

        cache.put("admin", &stored).await.unwrap();

        assert_eq!(cache.get("admin").await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn test_oversized_ttl_builds_a_working_cache() {
        let cache = MemoryAuthCache::new(&AuthCacheConfig { max_capacity: 10, ttl_secs: u64::MAX });
        let stored = session("t-1", Duration::hours(1));

        cache.put("admin", &stored).await.unwrap();

        assert_eq!(cache.get("admin").await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn test_absent_user_is_a_miss() {
        let cache = MemoryAuthCache::default();
        cache.put("admin", &session("t-1", Duration::hours(1))).await.unwrap();

        assert_eq!(cache.get("alice").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_session_is_a_miss_and_evicted() {
        let cache = MemoryAuthCache::default();
        cache.put("admin", &session("old", Duration::seconds(-5))).await.unwrap();

        assert_eq!(cache.get("admin").await.unwrap(), None);
        assert!(!cache.sessions.contains_key("admin"));
    }

    #[tokio::test]
    async fn test_put_replaces_previous_session() {
        let cache = MemoryAuthCache::default();
        cache.put("admin", &session("t-1", Duration::hours(1))).await.unwrap();
        let fresh = session("t-2", Duration::hours(1));

        cache.put("admin", &fresh).await.unwrap();

        assert_eq!(cache.get("admin").await.unwrap().unwrap().token(), "t-2");
    }
}
