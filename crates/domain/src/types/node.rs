//! Storage node handle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::{resource_id, Health, Resource, ResourceKind, Version};
use super::Labels;

resource_id!(
    /// Identifier of a node
    NodeId
);

/// A member node of the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub health: Health,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub io_endpoint: String,
    #[serde(default)]
    pub supervisor_endpoint: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}

impl Resource for Node {
    type Id = NodeId;
    const KIND: ResourceKind = ResourceKind::Node;

    fn id(&self) -> &NodeId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &Version {
        &self.version
    }
}
