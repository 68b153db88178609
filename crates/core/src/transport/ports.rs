//! Port interface for control plane round trips
//!
//! Each method is exactly one round trip (or, for `use_session`, a local
//! credential swap). Implementations never retry; retry policy belongs to
//! decorators such as [`TransportWithReauth`](crate::auth::TransportWithReauth).

use async_trait::async_trait;
use storectl_domain::{
    AuthSession, Cluster, CreateNamespaceParams, CreatePolicyGroupParams, CreateUserParams,
    CreateVolumeParams, Namespace, NamespaceId, Node, NodeId, PolicyGroup, PolicyGroupId, Result,
    UpdateClusterParams, User, UserId, Version, Volume, VolumeId,
};

use crate::context::RequestContext;

/// One method per resource verb
///
/// `version` arguments carry the compare-and-swap token of the last read;
/// `None` writes unconditionally.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Exchange credentials for a fresh session and install it
    async fn authenticate(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> Result<AuthSession>;

    /// Install a previously obtained session without a round trip
    async fn use_session(&self, ctx: &RequestContext, session: &AuthSession) -> Result<()>;

    async fn get_cluster(&self, ctx: &RequestContext) -> Result<Cluster>;

    async fn update_cluster(
        &self,
        ctx: &RequestContext,
        params: &UpdateClusterParams,
    ) -> Result<Cluster>;

    async fn get_node(&self, ctx: &RequestContext, id: &NodeId) -> Result<Node>;

    async fn list_nodes(&self, ctx: &RequestContext) -> Result<Vec<Node>>;

    async fn delete_node(
        &self,
        ctx: &RequestContext,
        id: &NodeId,
        version: Option<&Version>,
    ) -> Result<()>;

    async fn get_namespace(&self, ctx: &RequestContext, id: &NamespaceId) -> Result<Namespace>;

    async fn list_namespaces(&self, ctx: &RequestContext) -> Result<Vec<Namespace>>;

    async fn create_namespace(
        &self,
        ctx: &RequestContext,
        params: &CreateNamespaceParams,
    ) -> Result<Namespace>;

    async fn delete_namespace(
        &self,
        ctx: &RequestContext,
        id: &NamespaceId,
        version: Option<&Version>,
    ) -> Result<()>;

    async fn get_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
    ) -> Result<Volume>;

    /// List the volumes of one namespace
    ///
    /// Fails with `Unauthorised` when the caller has no access to the
    /// namespace.
    async fn list_volumes(&self, ctx: &RequestContext, namespace: &NamespaceId)
        -> Result<Vec<Volume>>;

    async fn create_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        params: &CreateVolumeParams,
    ) -> Result<Volume>;

    async fn delete_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        version: Option<&Version>,
    ) -> Result<()>;

    async fn attach_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        node: &NodeId,
    ) -> Result<()>;

    async fn detach_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        version: Option<&Version>,
    ) -> Result<()>;

    async fn get_user(&self, ctx: &RequestContext, id: &UserId) -> Result<User>;

    async fn list_users(&self, ctx: &RequestContext) -> Result<Vec<User>>;

    async fn create_user(&self, ctx: &RequestContext, params: &CreateUserParams) -> Result<User>;

    async fn delete_user(
        &self,
        ctx: &RequestContext,
        id: &UserId,
        version: Option<&Version>,
    ) -> Result<()>;

    async fn get_policy_group(&self, ctx: &RequestContext, id: &PolicyGroupId)
        -> Result<PolicyGroup>;

    async fn list_policy_groups(&self, ctx: &RequestContext) -> Result<Vec<PolicyGroup>>;

    async fn create_policy_group(
        &self,
        ctx: &RequestContext,
        params: &CreatePolicyGroupParams,
    ) -> Result<PolicyGroup>;

    async fn delete_policy_group(
        &self,
        ctx: &RequestContext,
        id: &PolicyGroupId,
        version: Option<&Version>,
    ) -> Result<()>;
}
