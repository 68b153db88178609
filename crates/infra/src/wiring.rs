//! Assembly of the full client stack

use std::sync::Arc;

use storectl_core::{
    AuthCache, AuthCachedTransport, Client, CredentialsProvider, TransportWithReauth,
};
use storectl_domain::{ClientConfig, Result};

use crate::cache::MemoryAuthCache;
use crate::config::ConfigCredentials;
use crate::http::HttpTransport;

/// Build a [`Client`] over `HttpTransport → AuthCachedTransport →
/// TransportWithReauth`
///
/// The client and the re-authentication decorator share one
/// [`ConfigCredentials`] built from `config`.
///
/// # Errors
///
/// Returns `ApiError::Config` if the endpoint is invalid or the HTTP client
/// cannot be constructed.
pub fn build_client(config: &ClientConfig, cache: Arc<dyn AuthCache>) -> Result<Client> {
    let credentials: Arc<dyn CredentialsProvider> =
        Arc::new(ConfigCredentials::from_config(config.clone()));

    let wire = HttpTransport::new(config)?;
    let cached = AuthCachedTransport::new(wire, cache);
    let chain = TransportWithReauth::new(cached, credentials.clone());

    tracing::debug!(endpoint = %config.endpoint, username = %config.username, "client assembled");

    Client::builder().transport(Arc::new(chain)).credentials(credentials).build()
}

/// [`build_client`] with a fresh [`MemoryAuthCache`] sized from `config`
pub fn build_default_client(config: &ClientConfig) -> Result<Client> {
    build_client(config, Arc::new(MemoryAuthCache::new(&config.auth_cache)))
}

#[cfg(test)]
mod tests {
    use storectl_domain::ApiError;

    use super::*;

    #[test]
    fn test_invalid_endpoint_fails_at_build_time() {
        let config = ClientConfig::new("not a url", "admin", "pw");
        let err = build_default_client(&config).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn test_valid_config_builds() {
        let config = ClientConfig::new("http://127.0.0.1:5705/v2", "admin", "pw");
        assert!(build_default_client(&config).is_ok());
    }

    #[test]
    fn test_oversized_cache_ttl_still_builds() {
        let mut config = ClientConfig::new("http://127.0.0.1:5705/v2", "admin", "pw");
        config.auth_cache.ttl_secs = 40_000_000_000;
        assert!(build_default_client(&config).is_ok());
    }
}
