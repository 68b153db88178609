//! Volume handle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::{resource_id, Health, Resource, ResourceKind, Version};
use super::namespace::NamespaceId;
use super::node::NodeId;
use super::Labels;

resource_id!(
    /// Identifier of a volume
    VolumeId
);

/// A provisioned volume living in exactly one namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub id: VolumeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub namespace_id: NamespaceId,
    pub size_bytes: u64,
    #[serde(default)]
    pub fs_type: String,
    #[serde(default)]
    pub health: Health,
    #[serde(default)]
    pub labels: Labels,
    /// Node the volume is currently attached to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_on: Option<NodeId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}

impl Volume {
    pub fn is_attached(&self) -> bool {
        self.attached_on.is_some()
    }
}

impl Resource for Volume {
    type Id = VolumeId;
    const KIND: ResourceKind = ResourceKind::Volume;

    fn id(&self) -> &VolumeId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &Version {
        &self.version
    }
}
