//! Session management decorators
//!
//! Two stackable [`Transport`](crate::Transport) decorators:
//!
//! - [`AuthCachedTransport`] short-circuits `authenticate` with a cached
//!   session when one is usable.
//! - [`TransportWithReauth`] re-authenticates once and retries once when an
//!   operation reports `AuthenticationRequired`.
//!
//! Compose them as `TransportWithReauth(AuthCachedTransport(wire))` so the
//! re-authentication triggered by an expired session goes through the
//! cache-aware path.

pub mod cached;
pub mod ports;
pub mod reauth;

pub use cached::AuthCachedTransport;
pub use ports::{AuthCache, CredentialsProvider, StaticCredentials};
pub use reauth::TransportWithReauth;
