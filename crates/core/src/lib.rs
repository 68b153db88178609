//! # storectl Core
//!
//! Transport-agnostic logic of the control plane client.
//!
//! This crate contains:
//! - Port interfaces (`Transport`, `AuthCache`, `CredentialsProvider`)
//! - Request context with cancellation and deadlines
//! - Session decorators (`AuthCachedTransport`, `TransportWithReauth`)
//! - The `Client` façade with strict identifier resolution and
//!   cross-namespace aggregation
//!
//! ## Architecture Principles
//! - Only depends on `storectl-domain`
//! - No HTTP or filesystem code; the wire transport lives in
//!   `storectl-infra`
//! - Decorators compose explicitly: each holds the next `Transport` and
//!   forwards every operation it does not intercept
//!
//! ## Composition
//!
//! ```text
//! Client ──► TransportWithReauth ──► AuthCachedTransport ──► wire Transport
//!                  │                          │
//!                  └─ CredentialsProvider     └─ AuthCache
//! ```

pub mod auth;
pub mod client;
pub mod context;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use auth::ports::{AuthCache, CredentialsProvider, StaticCredentials};
pub use auth::{AuthCachedTransport, TransportWithReauth};
pub use client::aggregate::fetch_across_partitions;
pub use client::filter::{filter_by_ids, filter_by_names};
pub use client::{Client, ClientBuilder};
pub use context::RequestContext;
pub use transport::ports::Transport;
