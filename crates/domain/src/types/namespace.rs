//! Namespace handle
//!
//! Namespaces partition volumes and scope authorization: a caller may be
//! able to list some namespaces' volumes and not others.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::{resource_id, Resource, ResourceKind, Version};
use super::Labels;

resource_id!(
    /// Identifier of a namespace
    NamespaceId
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub id: NamespaceId,
    pub name: String,
    #[serde(default)]
    pub labels: Labels,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}

impl Resource for Namespace {
    type Id = NamespaceId;
    const KIND: ResourceKind = ResourceKind::Namespace;

    fn id(&self) -> &NamespaceId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &Version {
        &self.version
    }
}
