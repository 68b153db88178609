//! # storectl Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - The reqwest-based `HttpClient` and the wire `HttpTransport`
//! - `MemoryAuthCache`, a moka-backed session cache
//! - Configuration loading and `ConfigCredentials`
//! - Tracing subscriber setup
//! - `build_client`, which assembles the full decorator chain
//!
//! ## Architecture
//! - Implements traits defined in `storectl-core`
//! - Contains all "impure" code (network, environment, files)

pub mod cache;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod wiring;

// Re-export commonly used items
pub use cache::MemoryAuthCache;
pub use config::ConfigCredentials;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder, HttpTransport};
pub use wiring::{build_client, build_default_client};
