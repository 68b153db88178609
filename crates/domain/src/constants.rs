//! Domain constants
//!
//! Centralized location for constants shared by the transport layers.

// Authentication
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const BEARER_PREFIX: &str = "Bearer ";
pub const REDACTED: &str = "<redacted>";

// Client defaults
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5705/v2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_USER_AGENT: &str = concat!("storectl/", env!("CARGO_PKG_VERSION"));

// Auth cache defaults
pub const DEFAULT_AUTH_CACHE_CAPACITY: u64 = 64;
pub const DEFAULT_AUTH_CACHE_TTL_SECS: u64 = 3600;
/// Longest accepted session cache TTL (one year)
pub const MAX_AUTH_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;
