//! # storectl Domain
//!
//! Value types shared by every layer of the storage control plane client.
//!
//! This crate contains:
//! - Session types (`AuthSession`, `Credentials`)
//! - Resource handles (`Node`, `Volume`, `Namespace`, `User`, `PolicyGroup`,
//!   `Cluster`) and their identifier newtypes
//! - Request parameter structs for create/update operations
//! - `ClientConfig`, the serde model of the client configuration
//! - The `ApiError` type and its closed `ErrorKind` taxonomy
//!
//! ## Architecture
//! - No dependencies on other storectl crates
//! - No I/O, no async
//! - Resource handles are immutable values: the client filters and
//!   aggregates them but never mutates them

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::{AuthCacheConfig, ClientConfig};
pub use errors::*;
pub use types::*;
