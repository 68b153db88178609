//! Client façade over a (possibly decorated) transport
//!
//! Every operation authenticates with the configured credentials before it
//! touches a resource; a failed login short-circuits the call. Listings
//! narrowed by IDs or names use strict resolution, and whole-cluster volume
//! listings fan out across namespaces.

pub mod aggregate;
pub mod filter;

use std::fmt;
use std::sync::Arc;

use storectl_domain::{
    ApiError, AuthSession, Cluster, CreateNamespaceParams, CreatePolicyGroupParams,
    CreateUserParams, CreateVolumeParams, Namespace, NamespaceId, Node, NodeId, PolicyGroup,
    PolicyGroupId, Resource, Result, UpdateClusterParams, User, UserId, Version, Volume, VolumeId,
};
use tracing::{debug, instrument};

use self::aggregate::fetch_across_partitions;
use self::filter::{filter_by_ids, filter_by_names};
use crate::auth::ports::CredentialsProvider;
use crate::context::RequestContext;
use crate::transport::Transport;

/// Resolve exactly one resource by name
fn resolve_one<R: Resource + Clone>(items: Vec<R>, name: &str) -> Result<R> {
    filter_by_names(items, &[name])?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found_name(R::KIND, name))
}

/// Control plane client
pub struct Client {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialsProvider>,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>, credentials: Arc<dyn CredentialsProvider>) -> Self {
        Self { transport, credentials }
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Log in with the current credentials
    ///
    /// Credentials are read from the provider on every call.
    ///
    /// # Errors
    ///
    /// Returns the credential lookup error or the login error.
    #[instrument(skip(self, ctx))]
    pub async fn authenticate(&self, ctx: &RequestContext) -> Result<AuthSession> {
        let username = self.credentials.username()?;
        let password = self.credentials.password()?;
        debug!(username = %username, "authenticating");
        self.transport.authenticate(ctx, &username, &password).await
    }

    // Cluster

    pub async fn get_cluster(&self, ctx: &RequestContext) -> Result<Cluster> {
        self.authenticate(ctx).await?;
        self.transport.get_cluster(ctx).await
    }

    pub async fn update_cluster(
        &self,
        ctx: &RequestContext,
        params: &UpdateClusterParams,
    ) -> Result<Cluster> {
        self.authenticate(ctx).await?;
        self.transport.update_cluster(ctx, params).await
    }

    // Nodes

    pub async fn get_node(&self, ctx: &RequestContext, id: &NodeId) -> Result<Node> {
        self.authenticate(ctx).await?;
        self.transport.get_node(ctx, id).await
    }

    pub async fn get_node_by_name(&self, ctx: &RequestContext, name: &str) -> Result<Node> {
        self.authenticate(ctx).await?;
        resolve_one(self.transport.list_nodes(ctx).await?, name)
    }

    /// List nodes, narrowed to `ids` when any are given
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for the first requested ID that does not exist.
    pub async fn list_nodes(&self, ctx: &RequestContext, ids: &[NodeId]) -> Result<Vec<Node>> {
        self.authenticate(ctx).await?;
        filter_by_ids(self.transport.list_nodes(ctx).await?, ids)
    }

    pub async fn list_nodes_by_name<S: AsRef<str>>(
        &self,
        ctx: &RequestContext,
        names: &[S],
    ) -> Result<Vec<Node>> {
        self.authenticate(ctx).await?;
        filter_by_names(self.transport.list_nodes(ctx).await?, names)
    }

    pub async fn delete_node(
        &self,
        ctx: &RequestContext,
        id: &NodeId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.authenticate(ctx).await?;
        self.transport.delete_node(ctx, id, version).await
    }

    // Namespaces

    pub async fn get_namespace(&self, ctx: &RequestContext, id: &NamespaceId) -> Result<Namespace> {
        self.authenticate(ctx).await?;
        self.transport.get_namespace(ctx, id).await
    }

    pub async fn get_namespace_by_name(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<Namespace> {
        self.authenticate(ctx).await?;
        resolve_one(self.transport.list_namespaces(ctx).await?, name)
    }

    pub async fn list_namespaces(
        &self,
        ctx: &RequestContext,
        ids: &[NamespaceId],
    ) -> Result<Vec<Namespace>> {
        self.authenticate(ctx).await?;
        filter_by_ids(self.transport.list_namespaces(ctx).await?, ids)
    }

    pub async fn list_namespaces_by_name<S: AsRef<str>>(
        &self,
        ctx: &RequestContext,
        names: &[S],
    ) -> Result<Vec<Namespace>> {
        self.authenticate(ctx).await?;
        filter_by_names(self.transport.list_namespaces(ctx).await?, names)
    }

    pub async fn create_namespace(
        &self,
        ctx: &RequestContext,
        params: &CreateNamespaceParams,
    ) -> Result<Namespace> {
        self.authenticate(ctx).await?;
        self.transport.create_namespace(ctx, params).await
    }

    pub async fn delete_namespace(
        &self,
        ctx: &RequestContext,
        id: &NamespaceId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.authenticate(ctx).await?;
        self.transport.delete_namespace(ctx, id, version).await
    }

    // Volumes

    pub async fn get_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
    ) -> Result<Volume> {
        self.authenticate(ctx).await?;
        self.transport.get_volume(ctx, namespace, id).await
    }

    pub async fn get_volume_by_name(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        name: &str,
    ) -> Result<Volume> {
        self.authenticate(ctx).await?;
        resolve_one(self.transport.list_volumes(ctx, namespace).await?, name)
    }

    pub async fn list_namespace_volumes(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        ids: &[VolumeId],
    ) -> Result<Vec<Volume>> {
        self.authenticate(ctx).await?;
        filter_by_ids(self.transport.list_volumes(ctx, namespace).await?, ids)
    }

    pub async fn list_namespace_volumes_by_name<S: AsRef<str>>(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        names: &[S],
    ) -> Result<Vec<Volume>> {
        self.authenticate(ctx).await?;
        filter_by_names(self.transport.list_volumes(ctx, namespace).await?, names)
    }

    /// Every volume visible to the caller, across all namespaces
    ///
    /// Namespaces whose volumes the caller may not list are skipped.
    ///
    /// # Errors
    ///
    /// Returns the namespace listing error, or the first volume listing
    /// error that is not `Unauthorised`. No partial result is returned.
    #[instrument(skip(self, ctx))]
    pub async fn get_all_volumes(&self, ctx: &RequestContext) -> Result<Vec<Volume>> {
        self.authenticate(ctx).await?;
        let namespaces = self.transport.list_namespaces(ctx).await?;

        let transport = &self.transport;
        fetch_across_partitions(namespaces, |namespace| {
            let id = namespace.id.clone();
            async move { transport.list_volumes(ctx, &id).await }
        })
        .await
    }

    pub async fn create_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        params: &CreateVolumeParams,
    ) -> Result<Volume> {
        self.authenticate(ctx).await?;
        self.transport.create_volume(ctx, namespace, params).await
    }

    pub async fn delete_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.authenticate(ctx).await?;
        self.transport.delete_volume(ctx, namespace, id, version).await
    }

    /// Delete a volume named `name`, guarded by the version just read
    pub async fn delete_volume_by_name(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        name: &str,
    ) -> Result<()> {
        self.authenticate(ctx).await?;
        let volume = resolve_one(self.transport.list_volumes(ctx, namespace).await?, name)?;
        self.transport.delete_volume(ctx, namespace, &volume.id, Some(&volume.version)).await
    }

    pub async fn attach_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        node: &NodeId,
    ) -> Result<()> {
        self.authenticate(ctx).await?;
        self.transport.attach_volume(ctx, namespace, id, node).await
    }

    /// Attach a volume to a node, both given by name
    ///
    /// # Errors
    ///
    /// Returns `NotFound` naming the volume or node if either does not
    /// resolve; nothing is attached in that case.
    pub async fn attach_volume_by_name(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        volume_name: &str,
        node_name: &str,
    ) -> Result<()> {
        self.authenticate(ctx).await?;
        let volume = resolve_one(self.transport.list_volumes(ctx, namespace).await?, volume_name)?;
        let node = resolve_one(self.transport.list_nodes(ctx).await?, node_name)?;
        self.transport.attach_volume(ctx, namespace, &volume.id, &node.id).await
    }

    pub async fn detach_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.authenticate(ctx).await?;
        self.transport.detach_volume(ctx, namespace, id, version).await
    }

    pub async fn detach_volume_by_name(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        name: &str,
    ) -> Result<()> {
        self.authenticate(ctx).await?;
        let volume = resolve_one(self.transport.list_volumes(ctx, namespace).await?, name)?;
        self.transport.detach_volume(ctx, namespace, &volume.id, Some(&volume.version)).await
    }

    // Users

    pub async fn get_user(&self, ctx: &RequestContext, id: &UserId) -> Result<User> {
        self.authenticate(ctx).await?;
        self.transport.get_user(ctx, id).await
    }

    pub async fn get_user_by_name(&self, ctx: &RequestContext, username: &str) -> Result<User> {
        self.authenticate(ctx).await?;
        resolve_one(self.transport.list_users(ctx).await?, username)
    }

    pub async fn list_users(&self, ctx: &RequestContext, ids: &[UserId]) -> Result<Vec<User>> {
        self.authenticate(ctx).await?;
        filter_by_ids(self.transport.list_users(ctx).await?, ids)
    }

    pub async fn list_users_by_name<S: AsRef<str>>(
        &self,
        ctx: &RequestContext,
        usernames: &[S],
    ) -> Result<Vec<User>> {
        self.authenticate(ctx).await?;
        filter_by_names(self.transport.list_users(ctx).await?, usernames)
    }

    pub async fn create_user(
        &self,
        ctx: &RequestContext,
        params: &CreateUserParams,
    ) -> Result<User> {
        self.authenticate(ctx).await?;
        self.transport.create_user(ctx, params).await
    }

    pub async fn delete_user(
        &self,
        ctx: &RequestContext,
        id: &UserId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.authenticate(ctx).await?;
        self.transport.delete_user(ctx, id, version).await
    }

    // Policy groups

    pub async fn get_policy_group(
        &self,
        ctx: &RequestContext,
        id: &PolicyGroupId,
    ) -> Result<PolicyGroup> {
        self.authenticate(ctx).await?;
        self.transport.get_policy_group(ctx, id).await
    }

    pub async fn get_policy_group_by_name(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<PolicyGroup> {
        self.authenticate(ctx).await?;
        resolve_one(self.transport.list_policy_groups(ctx).await?, name)
    }

    pub async fn list_policy_groups(
        &self,
        ctx: &RequestContext,
        ids: &[PolicyGroupId],
    ) -> Result<Vec<PolicyGroup>> {
        self.authenticate(ctx).await?;
        filter_by_ids(self.transport.list_policy_groups(ctx).await?, ids)
    }

    pub async fn list_policy_groups_by_name<S: AsRef<str>>(
        &self,
        ctx: &RequestContext,
        names: &[S],
    ) -> Result<Vec<PolicyGroup>> {
        self.authenticate(ctx).await?;
        filter_by_names(self.transport.list_policy_groups(ctx).await?, names)
    }

    pub async fn create_policy_group(
        &self,
        ctx: &RequestContext,
        params: &CreatePolicyGroupParams,
    ) -> Result<PolicyGroup> {
        self.authenticate(ctx).await?;
        self.transport.create_policy_group(ctx, params).await
    }

    pub async fn delete_policy_group(
        &self,
        ctx: &RequestContext,
        id: &PolicyGroupId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.authenticate(ctx).await?;
        self.transport.delete_policy_group(ctx, id, version).await
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

/// Builder for [`Client`]
#[derive(Default)]
pub struct ClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    credentials: Option<Arc<dyn CredentialsProvider>>,
}

impl ClientBuilder {
    /// Set the transport (usually the outermost decorator)
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the credentials provider
    pub fn credentials(mut self, credentials: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the transport or credentials are
    /// missing.
    pub fn build(self) -> Result<Client> {
        let transport =
            self.transport.ok_or_else(|| ApiError::Config("Transport not set".to_string()))?;
        let credentials = self
            .credentials
            .ok_or_else(|| ApiError::Config("Credentials provider not set".to_string()))?;

        Ok(Client::new(transport, credentials))
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("transport", &self.transport.is_some())
            .field("credentials", &self.credentials.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use storectl_domain::Labels;

    use super::*;
    use crate::auth::ports::StaticCredentials;
    use crate::testing::{fixtures, FakeTransport, ADMIN_PASSWORD, ADMIN_USERNAME};

    fn client_for(fake: &FakeTransport) -> Client {
        Client::builder()
            .transport(Arc::new(fake.clone()))
            .credentials(Arc::new(StaticCredentials::new(ADMIN_USERNAME, ADMIN_PASSWORD)))
            .build()
            .unwrap()
    }

    fn names<R: Resource>(items: &[R]) -> Vec<&str> {
        items.iter().map(Resource::name).collect()
    }

    #[test]
    fn test_builder_requires_transport() {
        let result = Client::builder()
            .credentials(Arc::new(StaticCredentials::new("a", "b")))
            .build();
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn test_builder_requires_credentials() {
        let result = Client::builder().transport(Arc::new(FakeTransport::new())).build();
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn test_debug_output_names_type_without_internals() {
        let fake = FakeTransport::new();
        let client = client_for(&fake);
        let builder = Client::builder().transport(Arc::new(fake));

        assert_eq!(format!("{client:?}"), "Client { .. }");
        assert_eq!(
            format!("{builder:?}"),
            "ClientBuilder { transport: true, credentials: false }"
        );
        assert!(!format!("{client:?}").contains(ADMIN_PASSWORD));
    }

    #[tokio::test]
    async fn test_every_operation_authenticates_first() {
        let fake = FakeTransport::seeded();
        let client = client_for(&fake);
        let ctx = RequestContext::background();

        client.get_cluster(&ctx).await.unwrap();
        client.list_nodes(&ctx, &[]).await.unwrap();
        client.get_user_by_name(&ctx, "alice").await.unwrap();

        assert_eq!(fake.calls("authenticate"), 3);
    }

    #[tokio::test]
    async fn test_failed_login_short_circuits() {
        let fake = FakeTransport::seeded();
        let client = Client::new(
            Arc::new(fake.clone()),
            Arc::new(StaticCredentials::new(ADMIN_USERNAME, "wrong")),
        );

        let err = client.list_nodes(&RequestContext::background(), &[]).await.unwrap_err();

        assert!(err.is_authentication_required());
        assert_eq!(fake.calls("list_nodes"), 0);
    }

    #[tokio::test]
    async fn test_list_by_ids_is_strict_and_ordered() {
        let fake = FakeTransport::seeded();
        let client = client_for(&fake);
        let ctx = RequestContext::background();

        let nodes =
            client.list_nodes(&ctx, &[fixtures::node_id(2), fixtures::node_id(1)]).await.unwrap();
        assert_eq!(names(&nodes), vec!["beta", "alpha"]);

        let err = client.list_nodes(&ctx, &[NodeId::new("node-7")]).await.unwrap_err();
        assert_eq!(err, ApiError::NotFound("node with id \"node-7\" not found".into()));
    }

    #[tokio::test]
    async fn test_list_by_names_is_strict() {
        let fake = FakeTransport::seeded();
        let client = client_for(&fake);
        let ctx = RequestContext::background();

        let groups = client.list_policy_groups_by_name(&ctx, &["ops"]).await.unwrap();
        assert_eq!(names(&groups), vec!["ops"]);

        let err = client.list_namespaces_by_name(&ctx, &["prod", "qa"]).await.unwrap_err();
        assert_eq!(err, ApiError::NotFound("namespace with name \"qa\" not found".into()));
    }

    #[tokio::test]
    async fn test_volume_names_resolve_within_namespace() {
        let fake = FakeTransport::seeded();
        let client = client_for(&fake);
        let ctx = RequestContext::background();

        let in_default =
            client.get_volume_by_name(&ctx, &fixtures::namespace_id(1), "db").await.unwrap();
        let in_prod =
            client.get_volume_by_name(&ctx, &fixtures::namespace_id(2), "db").await.unwrap();

        assert_eq!(in_default.id, fixtures::volume_id(1));
        assert_eq!(in_prod.id, fixtures::volume_id(3));

        let err = client
            .get_volume_by_name(&ctx, &fixtures::namespace_id(3), "db")
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::NotFound("volume with name \"db\" not found".into()));
    }

    #[tokio::test]
    async fn test_get_all_volumes_skips_denied_namespaces() {
        let fake = FakeTransport::seeded();
        fake.deny_namespace(&fixtures::namespace_id(2));
        let client = client_for(&fake);

        let volumes = client.get_all_volumes(&RequestContext::background()).await.unwrap();

        let ids: Vec<_> = volumes.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["vol-1", "vol-2", "vol-4"]);
    }

    #[tokio::test]
    async fn test_get_all_volumes_aborts_on_other_errors() {
        let fake = FakeTransport::seeded();
        let client = client_for(&fake);
        // ns-1 is skipped, ns-2 fails.
        fake.fail_next("list_volumes", ApiError::Unauthorised("skip".into()));
        fake.fail_next("list_volumes", ApiError::StoreError("disk".into()));

        let err = client.get_all_volumes(&RequestContext::background()).await.unwrap_err();

        assert_eq!(err, ApiError::StoreError("disk".into()));
        assert_eq!(fake.calls("list_volumes"), 2);
    }

    #[tokio::test]
    async fn test_get_all_volumes_namespace_listing_failure_is_fatal() {
        let fake = FakeTransport::seeded();
        let client = client_for(&fake);
        fake.fail_next("list_namespaces", ApiError::Unauthorised("no listing".into()));

        let err = client.get_all_volumes(&RequestContext::background()).await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorised(_)));
        assert_eq!(fake.calls("list_volumes"), 0);
    }

    #[tokio::test]
    async fn test_attach_by_name_resolves_both_sides() {
        let fake = FakeTransport::seeded();
        let client = client_for(&fake);
        let ctx = RequestContext::background();
        let ns = fixtures::namespace_id(1);

        client.attach_volume_by_name(&ctx, &ns, "cache", "beta").await.unwrap();

        let attached = fake.volumes_in(&ns).into_iter().find(|v| v.name == "cache").unwrap();
        assert_eq!(attached.attached_on, Some(fixtures::node_id(2)));

        let err = client.attach_volume_by_name(&ctx, &ns, "db", "omega").await.unwrap_err();
        assert_eq!(err, ApiError::NotFound("node with name \"omega\" not found".into()));
        assert_eq!(fake.calls("attach_volume"), 1);
    }

    #[tokio::test]
    async fn test_detach_by_name_uses_current_version() {
        let fake = FakeTransport::seeded();
        let client = client_for(&fake);
        let ctx = RequestContext::background();
        let ns = fixtures::namespace_id(1);

        client.attach_volume_by_name(&ctx, &ns, "db", "alpha").await.unwrap();
        client.detach_volume_by_name(&ctx, &ns, "db").await.unwrap();

        let volume = fake.volumes_in(&ns).into_iter().find(|v| v.name == "db").unwrap();
        assert!(!volume.is_attached());
    }

    #[tokio::test]
    async fn test_delete_with_stale_version_is_rejected() {
        let fake = FakeTransport::seeded();
        let client = client_for(&fake);
        let ctx = RequestContext::background();
        let ns = fixtures::namespace_id(1);

        let err = client
            .delete_volume(&ctx, &ns, &fixtures::volume_id(1), Some(&Version::new("0")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::StaleWrite(_)));

        client.delete_volume_by_name(&ctx, &ns, "db").await.unwrap();
        assert_eq!(fake.volumes_in(&ns).len(), 1);
    }

    #[tokio::test]
    async fn test_create_then_resolve_by_name() {
        let fake = FakeTransport::seeded();
        let client = client_for(&fake);
        let ctx = RequestContext::background();

        let params = CreateNamespaceParams { name: "qa".into(), labels: Labels::new() };

        let created = client
            .create_namespace(&ctx, &params)
            .await
            .unwrap();
        let resolved = client.get_namespace_by_name(&ctx, "qa").await.unwrap();
        assert_eq!(created, resolved);

        let err = client.create_namespace(&ctx, &params).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_credentials_error_is_returned_unchanged() {
        struct NoCredentials;

        impl CredentialsProvider for NoCredentials {
            fn username(&self) -> Result<String> {
                Err(ApiError::Config("username missing".into()))
            }

            fn password(&self) -> Result<String> {
                Ok(String::new())
            }
        }

        let fake = FakeTransport::seeded();
        let client = Client::new(Arc::new(fake.clone()), Arc::new(NoCredentials));

        let err = client.get_cluster(&RequestContext::background()).await.unwrap_err();

        assert_eq!(err, ApiError::Config("username missing".into()));
        assert_eq!(fake.calls("authenticate"), 0);
    }
}
