//! Configuration loading and management
//!
//! This module provides utilities for loading client configuration
//! from environment variables and files, and a credentials provider
//! reading from the same sources.

pub mod credentials;
pub mod loader;

// Re-export commonly used items
pub use credentials::ConfigCredentials;
pub use loader::{load, load_from_env, load_from_file, probe_config_paths};

/// Serialises tests that mutate process environment variables
#[cfg(test)]
pub(crate) static ENV_LOCK: once_cell::sync::Lazy<std::sync::Mutex<()>> =
    once_cell::sync::Lazy::new(|| std::sync::Mutex::new(()));
