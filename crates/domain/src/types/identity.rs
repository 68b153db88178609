//! Resource identity primitives
//!
//! Every resource handle has an opaque ID, a human name and a
//! compare-and-swap [`Version`]. The [`Resource`] trait exposes those three
//! so listings can be filtered generically.

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::impl_wire_enum_conversions;

/// Declares a transparent string newtype used as a resource ID
macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

pub(crate) use resource_id;

/// Kinds of resource exposed by the control plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Cluster,
    Node,
    Namespace,
    Volume,
    User,
    PolicyGroup,
}

impl_wire_enum_conversions!(ResourceKind {
    Cluster => "cluster",
    Node => "node",
    Namespace => "namespace",
    Volume => "volume",
    User => "user",
    PolicyGroup => "policy group",
});

/// Opaque compare-and-swap token
///
/// Returned with every resource and echoed back on writes so the server can
/// reject writes based on a stale read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reported health of a node or volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Online,
    Offline,
    Syncing,
    #[default]
    Unknown,
}

impl_wire_enum_conversions!(Health {
    Online => "online",
    Offline => "offline",
    Syncing => "syncing",
    Unknown => "unknown",
});

/// Common view over resource handles used by strict resolution
pub trait Resource {
    /// Identifier type of this resource
    type Id: Clone + Eq + Hash + fmt::Display;

    /// Kind reported in not-found errors
    const KIND: ResourceKind;

    fn id(&self) -> &Self::Id;

    fn name(&self) -> &str;

    fn version(&self) -> &Version;
}

#[cfg(test)]
mod tests {
    use super::*;

    resource_id!(
        /// Identifier used only by these tests
        WidgetId
    );

    #[test]
    fn test_resource_id_is_transparent() {
        let id = WidgetId::from("w-1");
        assert_eq!(id.as_str(), "w-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"w-1\"");
        let back: WidgetId = serde_json::from_str("\"w-2\"").unwrap();
        assert_eq!(back, WidgetId::new("w-2"));
    }

    #[test]
    fn test_resource_kind_labels() {
        assert_eq!(ResourceKind::PolicyGroup.to_string(), "policy group");
        assert_eq!(ResourceKind::Volume.as_str(), "volume");
    }

    #[test]
    fn test_health_defaults_to_unknown() {
        assert_eq!(Health::default(), Health::Unknown);
        let health: Health = serde_json::from_str("\"online\"").unwrap();
        assert_eq!(health, Health::Online);
    }
}
