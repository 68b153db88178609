//! JSON-over-HTTP implementation of the [`Transport`] port
//!
//! The bearer credential lives behind a reader/writer lock. Resource requests
//! hold the read lock while the Authorization header is attached and the
//! request is in flight; logins and session adoption take the write lock only
//! to swap the stored value. No request can observe a half-written header.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use storectl_core::{RequestContext, Transport};
use storectl_domain::constants::{AUTHORIZATION_HEADER, BEARER_PREFIX};
use storectl_domain::{
    ApiError, AuthSession, ClientConfig, Cluster, CreateNamespaceParams, CreatePolicyGroupParams,
    CreateUserParams, CreateVolumeParams, Namespace, NamespaceId, Node, NodeId, PolicyGroup,
    PolicyGroupId, Result, UpdateClusterParams, User, UserId, Version, Volume, VolumeId,
};
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use url::Url;

use super::client::HttpClient;
use crate::errors::{error_from_status, InfraError};

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AttachRequest<'a> {
    node_id: &'a NodeId,
}

/// Wire transport for one control plane endpoint
pub struct HttpTransport {
    http: HttpClient,
    endpoint: Url,
    bearer: RwLock<Option<String>>,
}

impl HttpTransport {
    /// Build a transport from configuration
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the endpoint is not an absolute base URL.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Self::with_client(http, &config.endpoint)
    }

    pub fn with_client(http: HttpClient, endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|err| ApiError::Config(format!("invalid endpoint {endpoint:?}: {err}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(ApiError::Config(format!("endpoint {endpoint} cannot be a base URL")));
        }

        Ok(Self { http, endpoint, bearer: RwLock::new(None) })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether a bearer credential is installed
    pub async fn has_session(&self) -> bool {
        self.bearer.read().await.is_some()
    }

    async fn install(&self, session: &AuthSession) {
        let mut bearer = self.bearer.write().await;
        *bearer = Some(format!("{BEARER_PREFIX}{}", session.token()));
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ApiError::Config(format!("endpoint {} cannot be a base URL", self.endpoint))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn dispatch<F>(
        &self,
        ctx: &RequestContext,
        method: Method,
        segments: &[&str],
        build: F,
    ) -> Result<Response>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder + Send,
    {
        let url = self.url(segments)?;

        ctx.run(async {
            let bearer = self.bearer.read().await;
            let mut request = self.http.request(method, url);
            if let Some(value) = bearer.as_deref() {
                request = request.header(AUTHORIZATION_HEADER, value);
            }
            let response = self.http.send(build(request)).await?;
            drop(bearer);

            ensure_success(response).await
        })
        .await
    }

    async fn get<T: DeserializeOwned>(&self, ctx: &RequestContext, segments: &[&str]) -> Result<T> {
        let response = self.dispatch(ctx, Method::GET, segments, |request| request).await?;
        ctx.run(decode(response)).await
    }

    async fn send_json<B, T>(
        &self,
        ctx: &RequestContext,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response =
            self.dispatch(ctx, method, segments, move |request| request.json(body)).await?;
        ctx.run(decode(response)).await
    }

    async fn remove(
        &self,
        ctx: &RequestContext,
        segments: &[&str],
        version: Option<&Version>,
    ) -> Result<()> {
        self.dispatch(ctx, Method::DELETE, segments, move |request| match version {
            Some(version) => request.query(&[("version", version.as_str())]),
            None => request,
        })
        .await
        .map(drop)
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport").field("endpoint", &self.endpoint.as_str()).finish()
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(error_from_status(status, &body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    response.json::<T>().await.map_err(|err| InfraError::from(err).into())
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, ctx, password))]
    async fn authenticate(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> Result<AuthSession> {
        let url = self.url(&["auth", "login"])?;

        let session: AuthSession = ctx
            .run(async {
                let request =
                    self.http.request(Method::POST, url).json(&LoginRequest { username, password });
                let response = ensure_success(self.http.send(request).await?).await?;
                decode(response).await
            })
            .await?;

        self.install(&session).await;
        debug!(expires_at = %session.expires_at(), "bearer credential installed");
        Ok(session)
    }

    async fn use_session(&self, ctx: &RequestContext, session: &AuthSession) -> Result<()> {
        ctx.check()?;
        self.install(session).await;
        Ok(())
    }

    async fn get_cluster(&self, ctx: &RequestContext) -> Result<Cluster> {
        self.get(ctx, &["cluster"]).await
    }

    async fn update_cluster(
        &self,
        ctx: &RequestContext,
        params: &UpdateClusterParams,
    ) -> Result<Cluster> {
        self.send_json(ctx, Method::PUT, &["cluster"], params).await
    }

    async fn get_node(&self, ctx: &RequestContext, id: &NodeId) -> Result<Node> {
        self.get(ctx, &["nodes", id.as_str()]).await
    }

    async fn list_nodes(&self, ctx: &RequestContext) -> Result<Vec<Node>> {
        self.get(ctx, &["nodes"]).await
    }

    async fn delete_node(
        &self,
        ctx: &RequestContext,
        id: &NodeId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.remove(ctx, &["nodes", id.as_str()], version).await
    }

    async fn get_namespace(&self, ctx: &RequestContext, id: &NamespaceId) -> Result<Namespace> {
        self.get(ctx, &["namespaces", id.as_str()]).await
    }

    async fn list_namespaces(&self, ctx: &RequestContext) -> Result<Vec<Namespace>> {
        self.get(ctx, &["namespaces"]).await
    }

    async fn create_namespace(
        &self,
        ctx: &RequestContext,
        params: &CreateNamespaceParams,
    ) -> Result<Namespace> {
        self.send_json(ctx, Method::POST, &["namespaces"], params).await
    }

    async fn delete_namespace(
        &self,
        ctx: &RequestContext,
        id: &NamespaceId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.remove(ctx, &["namespaces", id.as_str()], version).await
    }

    async fn get_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
    ) -> Result<Volume> {
        self.get(ctx, &["namespaces", namespace.as_str(), "volumes", id.as_str()]).await
    }

    async fn list_volumes(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
    ) -> Result<Vec<Volume>> {
        self.get(ctx, &["namespaces", namespace.as_str(), "volumes"]).await
    }

    async fn create_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        params: &CreateVolumeParams,
    ) -> Result<Volume> {
        self.send_json(ctx, Method::POST, &["namespaces", namespace.as_str(), "volumes"], params)
            .await
    }

    async fn delete_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.remove(ctx, &["namespaces", namespace.as_str(), "volumes", id.as_str()], version)
            .await
    }

    async fn attach_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        node: &NodeId,
    ) -> Result<()> {
        let body = AttachRequest { node_id: node };
        let segments = ["namespaces", namespace.as_str(), "volumes", id.as_str(), "attach"];

        self.dispatch(ctx, Method::POST, &segments, move |request| request.json(&body))
            .await
            .map(drop)
    }

    async fn detach_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        version: Option<&Version>,
    ) -> Result<()> {
        let segments = ["namespaces", namespace.as_str(), "volumes", id.as_str(), "attach"];
        self.remove(ctx, &segments, version).await
    }

    async fn get_user(&self, ctx: &RequestContext, id: &UserId) -> Result<User> {
        self.get(ctx, &["users", id.as_str()]).await
    }

    async fn list_users(&self, ctx: &RequestContext) -> Result<Vec<User>> {
        self.get(ctx, &["users"]).await
    }

    async fn create_user(&self, ctx: &RequestContext, params: &CreateUserParams) -> Result<User> {
        self.send_json(ctx, Method::POST, &["users"], params).await
    }

    async fn delete_user(
        &self,
        ctx: &RequestContext,
        id: &UserId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.remove(ctx, &["users", id.as_str()], version).await
    }

    async fn get_policy_group(
        &self,
        ctx: &RequestContext,
        id: &PolicyGroupId,
    ) -> Result<PolicyGroup> {
        self.get(ctx, &["policies", id.as_str()]).await
    }

    async fn list_policy_groups(&self, ctx: &RequestContext) -> Result<Vec<PolicyGroup>> {
        self.get(ctx, &["policies"]).await
    }

    async fn create_policy_group(
        &self,
        ctx: &RequestContext,
        params: &CreatePolicyGroupParams,
    ) -> Result<PolicyGroup> {
        self.send_json(ctx, Method::POST, &["policies"], params).await
    }

    async fn delete_policy_group(
        &self,
        ctx: &RequestContext,
        id: &PolicyGroupId,
        version: Option<&Version>,
    ) -> Result<()> {
        self.remove(ctx, &["policies", id.as_str()], version).await
    }
}
