//! Domain types and models
//!
//! Sessions, resource handles and request parameters exchanged with the
//! control plane.

pub mod cluster;
pub mod identity;
pub mod namespace;
pub mod node;
pub mod params;
pub mod policy;
pub mod session;
pub mod user;
pub mod volume;

pub use cluster::{Cluster, ClusterId};
pub use identity::{Health, Resource, ResourceKind, Version};
pub use namespace::{Namespace, NamespaceId};
pub use node::{Node, NodeId};
pub use params::{
    CreateNamespaceParams, CreatePolicyGroupParams, CreateUserParams, CreateVolumeParams,
    UpdateClusterParams,
};
pub use policy::{PolicyGroup, PolicyGroupId, PolicyGroupMember, PolicySpec};
pub use session::{AuthSession, Credentials};
pub use user::{User, UserId};
pub use volume::{Volume, VolumeId};

/// Labels attached to a resource
pub type Labels = std::collections::BTreeMap<String, String>;
