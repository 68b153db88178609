//! Cluster-wide configuration handle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::{resource_id, Version};

resource_id!(
    /// Identifier of the cluster
    ClusterId
);

/// Cluster-wide settings
///
/// There is exactly one cluster per control plane, so it has no name and
/// does not implement [`Resource`](super::Resource).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: ClusterId,
    #[serde(default)]
    pub disable_telemetry: bool,
    #[serde(default)]
    pub disable_crash_reporting: bool,
    #[serde(default)]
    pub disable_version_check: bool,
    pub log_level: String,
    pub log_format: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}
