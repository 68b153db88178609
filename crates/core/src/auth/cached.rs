//! Authentication short-circuit through a session cache
//!
//! `authenticate` first tries a cached session for the user and adopts it
//! without a login round trip. The cache is skipped when this instance has
//! most recently authenticated that same user: in that case the cache can
//! only hand back the session that was just used, which is exactly the one a
//! re-authentication is trying to replace.

use std::sync::Arc;

use async_trait::async_trait;
use storectl_domain::{
    AuthSession, Cluster, CreateNamespaceParams, CreatePolicyGroupParams, CreateUserParams,
    CreateVolumeParams, Namespace, NamespaceId, Node, NodeId, PolicyGroup, PolicyGroupId, Result,
    UpdateClusterParams, User, UserId, Version, Volume, VolumeId,
};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::ports::AuthCache;
use crate::context::RequestContext;
use crate::transport::Transport;

/// Decorates `authenticate` with a cache lookup
///
/// Every other operation is forwarded to the inner transport unchanged.
pub struct AuthCachedTransport<T> {
    inner: T,
    cache: Arc<dyn AuthCache>,
    // Guards the pairing of cache write and memo update.
    last_authed_username: Mutex<Option<String>>,
}

impl<T: Transport> AuthCachedTransport<T> {
    pub fn new(inner: T, cache: Arc<dyn AuthCache>) -> Self {
        Self { inner, cache, last_authed_username: Mutex::new(None) }
    }

    /// The wrapped transport
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Username most recently authenticated through this instance
    pub async fn last_authed_username(&self) -> Option<String> {
        self.last_authed_username.lock().await.clone()
    }

    /// Try to adopt the cached session for `username`
    ///
    /// Any failure along the way (miss, lookup error, rejected adoption) is a
    /// fall-through to real authentication.
    async fn try_cached_session(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> Option<AuthSession> {
        let session = match self.cache.get(username).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!(username, "auth cache miss");
                return None;
            }
            Err(err) => {
                debug!(username, error = %err, "auth cache lookup failed");
                return None;
            }
        };

        match self.inner.use_session(ctx, &session).await {
            Ok(()) => {
                debug!(username, "adopted cached session");
                Some(session)
            }
            Err(err) => {
                debug!(username, error = %err, "cached session adoption failed");
                None
            }
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for AuthCachedTransport<T> {
    #[instrument(skip(self, ctx, password))]
    async fn authenticate(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> Result<AuthSession> {
        let last = self.last_authed_username.lock().await.clone();

        if last.as_deref() == Some(username) {
            debug!(username, "skipping auth cache for most recently authenticated user");
        } else if let Some(session) = self.try_cached_session(ctx, username).await {
            *self.last_authed_username.lock().await = Some(username.to_string());
            return Ok(session);
        }

        ctx.check()?;
        let session = self.inner.authenticate(ctx, username, password).await?;

        let mut last = self.last_authed_username.lock().await;
        if let Err(err) = self.cache.put(username, &session).await {
            warn!(username, error = %err, "failed to cache session");
        }
        *last = Some(username.to_string());

        Ok(session)
    }

    async fn use_session(&self, ctx: &RequestContext, session: &AuthSession) -> Result<()> {
        self.inner.use_session(ctx, session).await
    }

    async fn get_cluster(&self, ctx: &RequestContext) -> Result<Cluster> {
        self.inner.get_cluster(ctx).await
    }

    async fn update_cluster(
        &self,
        ctx: &RequestContext,
        params: &UpdateClusterParams,
    ) -> Result<Cluster> {
        self.inner.update_cluster(ctx, params).await
    }

    async fn get_node(&self, ctx: &RequestContext, id: &NodeId) -> Result<Node> {
        self.inner.get_node(ctx, id).await
    }

    async fn list_nodes(&self, ctx: &RequestContext) -> Result<Vec<Node>> {
        self.inner.list_nodes(ctx).await
    }

    async fn delete_node(
        &self,
        ctx: &RequestContext,
        id: &NodeId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.inner.delete_node(ctx, id, version).await
    }

    async fn get_namespace(&self, ctx: &RequestContext, id: &NamespaceId) -> Result<Namespace> {
        self.inner.get_namespace(ctx, id).await
    }

    async fn list_namespaces(&self, ctx: &RequestContext) -> Result<Vec<Namespace>> {
        self.inner.list_namespaces(ctx).await
    }

    async fn create_namespace(
        &self,
        ctx: &RequestContext,
        params: &CreateNamespaceParams,
    ) -> Result<Namespace> {
        self.inner.create_namespace(ctx, params).await
    }

    async fn delete_namespace(
        &self,
        ctx: &RequestContext,
        id: &NamespaceId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.inner.delete_namespace(ctx, id, version).await
    }

    async fn get_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
    ) -> Result<Volume> {
        self.inner.get_volume(ctx, namespace, id).await
    }

    async fn list_volumes(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
    ) -> Result<Vec<Volume>> {
        self.inner.list_volumes(ctx, namespace).await
    }

    async fn create_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        params: &CreateVolumeParams,
    ) -> Result<Volume> {
        self.inner.create_volume(ctx, namespace, params).await
    }

    async fn delete_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.inner.delete_volume(ctx, namespace, id, version).await
    }

    async fn attach_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        node: &NodeId,
    ) -> Result<()> {
        self.inner.attach_volume(ctx, namespace, id, node).await
    }

    async fn detach_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.inner.detach_volume(ctx, namespace, id, version).await
    }

    async fn get_user(&self, ctx: &RequestContext, id: &UserId) -> Result<User> {
        self.inner.get_user(ctx, id).await
    }

    async fn list_users(&self, ctx: &RequestContext) -> Result<Vec<User>> {
        self.inner.list_users(ctx).await
    }

    async fn create_user(&self, ctx: &RequestContext, params: &CreateUserParams) -> Result<User> {
        self.inner.create_user(ctx, params).await
    }

    async fn delete_user(
        &self,
        ctx: &RequestContext,
        id: &UserId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.inner.delete_user(ctx, id, version).await
    }

    async fn get_policy_group(
        &self,
        ctx: &RequestContext,
        id: &PolicyGroupId,
    ) -> Result<PolicyGroup> {
        self.inner.get_policy_group(ctx, id).await
    }

    async fn list_policy_groups(&self, ctx: &RequestContext) -> Result<Vec<PolicyGroup>> {
        self.inner.list_policy_groups(ctx).await
    }

    async fn create_policy_group(
        &self,
        ctx: &RequestContext,
        params: &CreatePolicyGroupParams,
    ) -> Result<PolicyGroup> {
        self.inner.create_policy_group(ctx, params).await
    }

    async fn delete_policy_group(
        &self,
        ctx: &RequestContext,
        id: &PolicyGroupId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.inner.delete_policy_group(ctx, id, version).await
    }
}
