//! Transparent re-authentication on session expiry
//!
//! Any operation failing with `AuthenticationRequired` triggers one fresh
//! login with the current credentials, followed by exactly one more attempt
//! of the same operation. Every other outcome is returned unchanged.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use storectl_domain::{
    AuthSession, Cluster, CreateNamespaceParams, CreatePolicyGroupParams, CreateUserParams,
    CreateVolumeParams, Namespace, NamespaceId, Node, NodeId, PolicyGroup, PolicyGroupId, Result,
    UpdateClusterParams, User, UserId, Version, Volume, VolumeId,
};
use tracing::{debug, info};

use super::ports::CredentialsProvider;
use crate::context::RequestContext;
use crate::transport::Transport;

/// Retries operations once after re-establishing an expired session
pub struct TransportWithReauth<T> {
    inner: T,
    credentials: Arc<dyn CredentialsProvider>,
}

impl<T: Transport> TransportWithReauth<T> {
    pub fn new(inner: T, credentials: Arc<dyn CredentialsProvider>) -> Self {
        Self { inner, credentials }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Run `op`, re-authenticating and retrying once on session expiry
    ///
    /// `op` is invoked at most twice. Cancellation observed before the
    /// re-authentication or before the retry stops the sequence.
    ///
    /// # Errors
    ///
    /// Returns the first attempt's error if it is not
    /// `AuthenticationRequired`, any credential or login error, or the
    /// retry's result as-is.
    async fn do_with_reauth<R, F, Fut>(&self, ctx: &RequestContext, op: F) -> Result<R>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<R>> + Send,
        R: Send,
    {
        let err = match op().await {
            Err(err) if err.is_authentication_required() => err,
            other => return other,
        };

        ctx.check()?;
        info!(error = %err, "session rejected, re-authenticating");

        let username = self.credentials.username()?;
        let password = self.credentials.password()?;
        self.authenticate(ctx, &username, &password).await?;

        ctx.check()?;
        debug!("retrying operation with fresh session");
        op().await
    }
}

#[async_trait]
impl<T: Transport> Transport for TransportWithReauth<T> {
    async fn authenticate(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> Result<AuthSession> {
        self.inner.authenticate(ctx, username, password).await
    }

    async fn use_session(&self, ctx: &RequestContext, session: &AuthSession) -> Result<()> {
        self.inner.use_session(ctx, session).await
    }

    async fn get_cluster(&self, ctx: &RequestContext) -> Result<Cluster> {
        self.do_with_reauth(ctx, move || self.inner.get_cluster(ctx)).await
    }

    async fn update_cluster(
        &self,
        ctx: &RequestContext,
        params: &UpdateClusterParams,
    ) -> Result<Cluster> {
        self.do_with_reauth(ctx, move || self.inner.update_cluster(ctx, params)).await
    }

    async fn get_node(&self, ctx: &RequestContext, id: &NodeId) -> Result<Node> {
        self.do_with_reauth(ctx, move || self.inner.get_node(ctx, id)).await
    }

    async fn list_nodes(&self, ctx: &RequestContext) -> Result<Vec<Node>> {
        self.do_with_reauth(ctx, move || self.inner.list_nodes(ctx)).await
    }

    async fn delete_node(
        &self,
        ctx: &RequestContext,
        id: &NodeId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.do_with_reauth(ctx, move || self.inner.delete_node(ctx, id, version)).await
    }

    async fn get_namespace(&self, ctx: &RequestContext, id: &NamespaceId) -> Result<Namespace> {
        self.do_with_reauth(ctx, move || self.inner.get_namespace(ctx, id)).await
    }

    async fn list_namespaces(&self, ctx: &RequestContext) -> Result<Vec<Namespace>> {
        self.do_with_reauth(ctx, move || self.inner.list_namespaces(ctx)).await
    }

    async fn create_namespace(
        &self,
        ctx: &RequestContext,
        params: &CreateNamespaceParams,
    ) -> Result<Namespace> {
        self.do_with_reauth(ctx, move || self.inner.create_namespace(ctx, params)).await
    }

    async fn delete_namespace(
        &self,
        ctx: &RequestContext,
        id: &NamespaceId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.do_with_reauth(ctx, move || self.inner.delete_namespace(ctx, id, version)).await
    }

    async fn get_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
    ) -> Result<Volume> {
        self.do_with_reauth(ctx, move || self.inner.get_volume(ctx, namespace, id)).await
    }

    async fn list_volumes(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
    ) -> Result<Vec<Volume>> {
        self.do_with_reauth(ctx, move || self.inner.list_volumes(ctx, namespace)).await
    }

    async fn create_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        params: &CreateVolumeParams,
    ) -> Result<Volume> {
        self.do_with_reauth(ctx, move || self.inner.create_volume(ctx, namespace, params)).await
    }

    async fn delete_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.do_with_reauth(ctx, move || self.inner.delete_volume(ctx, namespace, id, version))
            .await
    }

    async fn attach_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        node: &NodeId,
    ) -> Result<()> {
        self.do_with_reauth(ctx, move || self.inner.attach_volume(ctx, namespace, id, node)).await
    }

    async fn detach_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.do_with_reauth(ctx, move || self.inner.detach_volume(ctx, namespace, id, version))
            .await
    }

    async fn get_user(&self, ctx: &RequestContext, id: &UserId) -> Result<User> {
        self.do_with_reauth(ctx, move || self.inner.get_user(ctx, id)).await
    }

    async fn list_users(&self, ctx: &RequestContext) -> Result<Vec<User>> {
        self.do_with_reauth(ctx, move || self.inner.list_users(ctx)).await
    }

    async fn create_user(&self, ctx: &RequestContext, params: &CreateUserParams) -> Result<User> {
        self.do_with_reauth(ctx, move || self.inner.create_user(ctx, params)).await
    }

    async fn delete_user(
        &self,
        ctx: &RequestContext,
        id: &UserId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.do_with_reauth(ctx, move || self.inner.delete_user(ctx, id, version)).await
    }

    async fn get_policy_group(
        &self,
        ctx: &RequestContext,
        id: &PolicyGroupId,
    ) -> Result<PolicyGroup> {
        self.do_with_reauth(ctx, move || self.inner.get_policy_group(ctx, id)).await
    }

    async fn list_policy_groups(&self, ctx: &RequestContext) -> Result<Vec<PolicyGroup>> {
        self.do_with_reauth(ctx, move || self.inner.list_policy_groups(ctx)).await
    }

    async fn create_policy_group(
        &self,
        ctx: &RequestContext,
        params: &CreatePolicyGroupParams,
    ) -> Result<PolicyGroup> {
        self.do_with_reauth(ctx, move || self.inner.create_policy_group(ctx, params)).await
    }

    async fn delete_policy_group(
        &self,
        ctx: &RequestContext,
        id: &PolicyGroupId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.do_with_reauth(ctx, move || self.inner.delete_policy_group(ctx, id, version)).await
    }
}
