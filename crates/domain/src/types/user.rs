//! User account handle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::{resource_id, Resource, ResourceKind, Version};
use super::policy::PolicyGroupId;

resource_id!(
    /// Identifier of a user
    UserId
);

/// A user account; its username doubles as its name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub groups: Vec<PolicyGroupId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}

impl Resource for User {
    type Id = UserId;
    const KIND: ResourceKind = ResourceKind::User;

    fn id(&self) -> &UserId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.username
    }

    fn version(&self) -> &Version {
        &self.version
    }
}
