//! Request parameters for create and update operations

use std::fmt;

use serde::{Deserialize, Serialize};

use super::identity::Version;
use super::policy::{PolicyGroupId, PolicySpec};
use super::Labels;
use crate::constants::REDACTED;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNamespaceParams {
    pub name: String,
    #[serde(default)]
    pub labels: Labels,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVolumeParams {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub fs_type: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub labels: Labels,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserParams {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub with_admin: bool,
    #[serde(default)]
    pub groups: Vec<PolicyGroupId>,
}

impl fmt::Debug for CreateUserParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUserParams")
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("with_admin", &self.with_admin)
            .field("groups", &self.groups)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePolicyGroupParams {
    pub name: String,
    #[serde(default)]
    pub specs: Vec<PolicySpec>,
}

/// Replacement cluster settings; `version` guards the write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClusterParams {
    pub disable_telemetry: bool,
    pub disable_crash_reporting: bool,
    pub disable_version_check: bool,
    pub log_level: String,
    pub log_format: String,
    pub version: Version,
}
