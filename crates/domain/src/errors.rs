//! Error types used throughout the client
//!
//! Every failed operation carries an [`ApiError`]. Control flow (retry, skip,
//! abort) is decided by [`ApiError::kind`], never by message text.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::impl_wire_enum_conversions;
use crate::types::ResourceKind;

/// Closed taxonomy of API failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request was malformed or failed validation (400)
    BadRequest,
    /// The session is missing or expired (401); the only retried kind
    AuthenticationRequired,
    /// The caller is authenticated but forbidden (403)
    Unauthorised,
    /// The target resource does not exist (404)
    NotFound,
    /// The resource already exists or conflicts with another (409)
    Conflict,
    /// The compare-and-swap version did not match (412)
    StaleWrite,
    /// The resource cannot move to the requested state (422)
    InvalidStateTransition,
    /// The cluster licence does not allow the operation (402)
    LicenceCapacityExceeded,
    /// The server failed internally (5xx)
    ServerError,
    /// The server's backing store failed (503)
    StoreError,
    /// Anything else, including local transport failures
    Unknown,
}

impl_wire_enum_conversions!(ErrorKind {
    BadRequest => "bad_request",
    AuthenticationRequired => "authentication_required",
    Unauthorised => "unauthorised",
    NotFound => "not_found",
    Conflict => "conflict",
    StaleWrite => "stale_write",
    InvalidStateTransition => "invalid_state_transition",
    LicenceCapacityExceeded => "licence_capacity_exceeded",
    ServerError => "server_error",
    StoreError => "store_error",
    Unknown => "unknown",
});

/// API operation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("Unauthorised: {0}")]
    Unauthorised(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Stale write: {0}")]
    StaleWrite(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Licence capacity exceeded: {0}")]
    LicenceCapacityExceeded(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,
}

impl ApiError {
    /// Get the taxonomy kind for this error
    ///
    /// Local failures (network, decoding, configuration, timeout,
    /// cancellation) have no API meaning and report [`ErrorKind::Unknown`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::AuthenticationRequired(_) => ErrorKind::AuthenticationRequired,
            Self::Unauthorised(_) => ErrorKind::Unauthorised,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::StaleWrite(_) => ErrorKind::StaleWrite,
            Self::InvalidStateTransition(_) => ErrorKind::InvalidStateTransition,
            Self::LicenceCapacityExceeded(_) => ErrorKind::LicenceCapacityExceeded,
            Self::ServerError(_) => ErrorKind::ServerError,
            Self::StoreError(_) => ErrorKind::StoreError,
            Self::Unknown(_)
            | Self::Network(_)
            | Self::Decode(_)
            | Self::Config(_)
            | Self::Timeout(_)
            | Self::Cancelled => ErrorKind::Unknown,
        }
    }

    /// Build an error of the given kind carrying `message`
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::BadRequest => Self::BadRequest(message),
            ErrorKind::AuthenticationRequired => Self::AuthenticationRequired(message),
            ErrorKind::Unauthorised => Self::Unauthorised(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::StaleWrite => Self::StaleWrite(message),
            ErrorKind::InvalidStateTransition => Self::InvalidStateTransition(message),
            ErrorKind::LicenceCapacityExceeded => Self::LicenceCapacityExceeded(message),
            ErrorKind::ServerError => Self::ServerError(message),
            ErrorKind::StoreError => Self::StoreError(message),
            ErrorKind::Unknown => Self::Unknown(message),
        }
    }

    /// Not-found error naming a resource by ID
    pub fn not_found_id(resource: ResourceKind, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{resource} with id \"{id}\" not found"))
    }

    /// Not-found error naming a resource by name
    pub fn not_found_name(resource: ResourceKind, name: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{resource} with name \"{name}\" not found"))
    }

    /// Whether this error means the session must be re-established
    pub fn is_authentication_required(&self) -> bool {
        self.kind() == ErrorKind::AuthenticationRequired
    }

    /// Whether the operation was abandoned because its context was
    /// cancelled or its deadline passed
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Timeout(_))
    }

    /// Stable label suitable for logging
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Decode(_) => "decode",
            Self::Config(_) => "config",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
            other => other.kind().as_str(),
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(ApiError::BadRequest("x".into()).kind(), ErrorKind::BadRequest);
        assert_eq!(
            ApiError::AuthenticationRequired("x".into()).kind(),
            ErrorKind::AuthenticationRequired
        );
        assert_eq!(ApiError::Unauthorised("x".into()).kind(), ErrorKind::Unauthorised);
        assert_eq!(ApiError::StaleWrite("x".into()).kind(), ErrorKind::StaleWrite);
        assert_eq!(ApiError::StoreError("x".into()).kind(), ErrorKind::StoreError);
    }

    #[test]
    fn test_local_failures_are_unknown() {
        assert_eq!(ApiError::Network("refused".into()).kind(), ErrorKind::Unknown);
        assert_eq!(ApiError::Config("no user".into()).kind(), ErrorKind::Unknown);
        assert_eq!(ApiError::Timeout(Duration::from_secs(1)).kind(), ErrorKind::Unknown);
        assert_eq!(ApiError::Cancelled.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_unauthorised_is_not_authentication_required() {
        assert!(ApiError::AuthenticationRequired("expired".into()).is_authentication_required());
        assert!(!ApiError::Unauthorised("forbidden".into()).is_authentication_required());
    }

    #[test]
    fn test_from_kind_preserves_kind() {
        for kind in [
            ErrorKind::BadRequest,
            ErrorKind::Conflict,
            ErrorKind::InvalidStateTransition,
            ErrorKind::LicenceCapacityExceeded,
            ErrorKind::Unknown,
        ] {
            assert_eq!(ApiError::from_kind(kind, "msg").kind(), kind);
        }
    }

    #[test]
    fn test_not_found_names_identifier() {
        let err = ApiError::not_found_name(ResourceKind::Volume, "db-1");
        assert_eq!(err.to_string(), "Not found: volume with name \"db-1\" not found");

        let err = ApiError::not_found_id(ResourceKind::Node, "n-42");
        assert!(err.to_string().contains("node with id \"n-42\""));
    }

    #[test]
    fn test_labels() {
        assert_eq!(ApiError::StaleWrite("v".into()).label(), "stale_write");
        assert_eq!(ApiError::Network("down".into()).label(), "network");
        assert_eq!(ApiError::Cancelled.label(), "cancelled");
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        assert_eq!(ErrorKind::from_str("STORE_ERROR").unwrap(), ErrorKind::StoreError);
        assert_eq!(ErrorKind::Unauthorised.to_string(), "unauthorised");
        assert!(ErrorKind::from_str("teapot").is_err());
    }
}
