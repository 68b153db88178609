//! Policy group handle
//!
//! A policy group grants its members access to namespaces. Membership in no
//! group covering a namespace is what makes listing that namespace's volumes
//! fail with `Unauthorised`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::{resource_id, Resource, ResourceKind, Version};
use super::namespace::NamespaceId;
use super::user::UserId;

resource_id!(
    /// Identifier of a policy group
    PolicyGroupId
);

/// Access rule granted by a policy group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySpec {
    pub namespace_id: NamespaceId,
    pub resource_type: String,
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyGroupMember {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyGroup {
    pub id: PolicyGroupId,
    pub name: String,
    #[serde(default)]
    pub users: Vec<PolicyGroupMember>,
    #[serde(default)]
    pub specs: Vec<PolicySpec>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}

impl Resource for PolicyGroup {
    type Id = PolicyGroupId;
    const KIND: ResourceKind = ResourceKind::PolicyGroup;

    fn id(&self) -> &PolicyGroupId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &Version {
        &self.version
    }
}
