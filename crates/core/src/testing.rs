//! In-memory test doubles for the core ports
//!
//! [`FakeTransport`] models a control plane with real session semantics:
//! logins issue tokens, every other operation requires the active token to
//! still be valid, and sessions can be expired on demand. Failures can be
//! queued per operation to script error paths.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use storectl_domain::{
    ApiError, AuthSession, Cluster, CreateNamespaceParams, CreatePolicyGroupParams,
    CreateUserParams, CreateVolumeParams, Namespace, NamespaceId, Node, NodeId, PolicyGroup,
    PolicyGroupId, Resource, ResourceKind, Result, UpdateClusterParams, User, UserId, Version,
    Volume, VolumeId,
};

use crate::auth::ports::AuthCache;
use crate::context::RequestContext;
use crate::transport::Transport;

pub const ADMIN_USERNAME: &str = "storageos";
pub const ADMIN_PASSWORD: &str = "storageos";

/// Builders for resource handles with predictable IDs
pub mod fixtures {
    use chrono::Utc;
    use storectl_domain::{
        AuthSession, Cluster, ClusterId, Health, Labels, Namespace, NamespaceId, Node, NodeId,
        PolicyGroup, PolicyGroupId, User, UserId, Version, Volume, VolumeId,
    };

    pub fn node_id(n: u32) -> NodeId {
        NodeId::new(format!("node-{n}"))
    }

    pub fn namespace_id(n: u32) -> NamespaceId {
        NamespaceId::new(format!("ns-{n}"))
    }

    pub fn volume_id(n: u32) -> VolumeId {
        VolumeId::new(format!("vol-{n}"))
    }

    pub fn user_id(n: u32) -> UserId {
        UserId::new(format!("user-{n}"))
    }

    pub fn policy_group_id(n: u32) -> PolicyGroupId {
        PolicyGroupId::new(format!("pg-{n}"))
    }

    pub fn cluster() -> Cluster {
        let now = Utc::now();
        Cluster {
            id: ClusterId::new("cluster-1"),
            disable_telemetry: false,
            disable_crash_reporting: false,
            disable_version_check: false,
            log_level: "info".into(),
            log_format: "default".into(),
            created_at: now,
            updated_at: now,
            version: Version::new("1"),
        }
    }

    pub fn node(n: u32, name: &str) -> Node {
        let now = Utc::now();
        Node {
            id: node_id(n),
            name: name.into(),
            health: Health::Online,
            labels: Labels::new(),
            io_endpoint: format!("10.0.0.{n}:5703"),
            supervisor_endpoint: format!("10.0.0.{n}:5704"),
            created_at: now,
            updated_at: now,
            version: Version::new("1"),
        }
    }

    pub fn namespace(n: u32, name: &str) -> Namespace {
        let now = Utc::now();
        Namespace {
            id: namespace_id(n),
            name: name.into(),
            labels: Labels::new(),
            created_at: now,
            updated_at: now,
            version: Version::new("1"),
        }
    }

    pub fn volume(namespace: &NamespaceId, n: u32, name: &str) -> Volume {
        let now = Utc::now();
        Volume {
            id: volume_id(n),
            name: name.into(),
            description: String::new(),
            namespace_id: namespace.clone(),
            size_bytes: 1 << 30,
            fs_type: "ext4".into(),
            health: Health::Online,
            labels: Labels::new(),
            attached_on: None,
            created_at: now,
            updated_at: now,
            version: Version::new("1"),
        }
    }

    pub fn user(n: u32, username: &str) -> User {
        let now = Utc::now();
        User {
            id: user_id(n),
            username: username.into(),
            is_admin: n == 1,
            groups: Vec::new(),
            created_at: now,
            updated_at: now,
            version: Version::new("1"),
        }
    }

    pub fn policy_group(n: u32, name: &str) -> PolicyGroup {
        let now = Utc::now();
        PolicyGroup {
            id: policy_group_id(n),
            name: name.into(),
            users: Vec::new(),
            specs: Vec::new(),
            created_at: now,
            updated_at: now,
            version: Version::new("1"),
        }
    }

    /// Session valid for the next hour
    pub fn session(token: &str) -> AuthSession {
        AuthSession::new(token, Utc::now() + chrono::Duration::hours(1))
    }
}

#[derive(Default)]
struct FakeState {
    credentials: HashMap<String, String>,
    active_token: Option<String>,
    valid_tokens: HashSet<String>,
    issued: u64,
    next_id: u32,
    cluster: Option<Cluster>,
    nodes: Vec<Node>,
    namespaces: Vec<Namespace>,
    volumes: HashMap<NamespaceId, Vec<Volume>>,
    users: Vec<User>,
    policy_groups: Vec<PolicyGroup>,
    denied_namespaces: HashSet<NamespaceId>,
    failures: HashMap<&'static str, VecDeque<ApiError>>,
    calls: HashMap<&'static str, usize>,
    cancel_on_login: Option<RequestContext>,
}

impl FakeState {
    fn issue(&mut self) -> AuthSession {
        self.issued += 1;
        let token = format!("token-{}", self.issued);
        self.valid_tokens.insert(token.clone());
        AuthSession::new(token, Utc::now() + Duration::hours(1))
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-new-{}", self.next_id)
    }

    fn namespace_volumes(&mut self, namespace: &NamespaceId) -> Result<&mut Vec<Volume>> {
        if !self.namespaces.iter().any(|ns| &ns.id == namespace) {
            return Err(ApiError::not_found_id(ResourceKind::Namespace, namespace));
        }
        Ok(self.volumes.entry(namespace.clone()).or_default())
    }
}

/// Scriptable in-memory [`Transport`]
///
/// Clones share state, so a test can keep a handle while the client owns
/// another.
#[derive(Clone)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTransport {
    /// Empty control plane accepting the admin credentials
    pub fn new() -> Self {
        let mut state = FakeState::default();
        state.credentials.insert(ADMIN_USERNAME.into(), ADMIN_PASSWORD.into());
        state.cluster = Some(fixtures::cluster());
        Self { state: Arc::new(Mutex::new(state)) }
    }

    /// Control plane with two nodes, three namespaces, four volumes, two
    /// users and two policy groups
    ///
    /// Volume names repeat across namespaces (`db` exists in `ns-1` and
    /// `ns-2`).
    pub fn seeded() -> Self {
        let ns1 = fixtures::namespace_id(1);
        let ns2 = fixtures::namespace_id(2);
        let ns3 = fixtures::namespace_id(3);
        Self::new()
            .with_nodes(vec![fixtures::node(1, "alpha"), fixtures::node(2, "beta")])
            .with_namespace(
                fixtures::namespace(1, "default"),
                vec![fixtures::volume(&ns1, 1, "db"), fixtures::volume(&ns1, 2, "cache")],
            )
            .with_namespace(fixtures::namespace(2, "prod"), vec![fixtures::volume(&ns2, 3, "db")])
            .with_namespace(
                fixtures::namespace(3, "staging"),
                vec![fixtures::volume(&ns3, 4, "logs")],
            )
            .with_users(vec![fixtures::user(1, ADMIN_USERNAME), fixtures::user(2, "alice")])
            .with_policy_groups(vec![
                fixtures::policy_group(1, "devs"),
                fixtures::policy_group(2, "ops"),
            ])
    }

    #[must_use]
    pub fn with_user(self, username: &str, password: &str) -> Self {
        self.lock().credentials.insert(username.into(), password.into());
        self
    }

    #[must_use]
    pub fn with_nodes(self, nodes: Vec<Node>) -> Self {
        self.lock().nodes.extend(nodes);
        self
    }

    #[must_use]
    pub fn with_namespace(self, namespace: Namespace, volumes: Vec<Volume>) -> Self {
        {
            let mut state = self.lock();
            state.volumes.entry(namespace.id.clone()).or_default().extend(volumes);
            state.namespaces.push(namespace);
        }
        self
    }

    #[must_use]
    pub fn with_users(self, users: Vec<User>) -> Self {
        self.lock().users.extend(users);
        self
    }

    #[must_use]
    pub fn with_policy_groups(self, groups: Vec<PolicyGroup>) -> Self {
        self.lock().policy_groups.extend(groups);
        self
    }

    /// Make `list_volumes` for `namespace` fail with `Unauthorised`
    pub fn deny_namespace(&self, namespace: &NamespaceId) {
        self.lock().denied_namespaces.insert(namespace.clone());
    }

    /// Register a valid session without making it active
    pub fn issue_session(&self) -> AuthSession {
        self.lock().issue()
    }

    /// Invalidate every issued session
    pub fn expire_sessions(&self) {
        self.lock().valid_tokens.clear();
    }

    /// Queue `err` as the next outcome of `op`
    pub fn fail_next(&self, op: &'static str, err: ApiError) {
        self.lock().failures.entry(op).or_default().push_back(err);
    }

    /// Cancel `ctx` as soon as the next login succeeds
    pub fn cancel_after_login(&self, ctx: &RequestContext) {
        self.lock().cancel_on_login = Some(ctx.clone());
    }

    /// Number of times `op` was invoked
    pub fn calls(&self, op: &str) -> usize {
        self.lock().calls.get(op).copied().unwrap_or(0)
    }

    pub fn active_token(&self) -> Option<String> {
        self.lock().active_token.clone()
    }

    pub fn volumes_in(&self, namespace: &NamespaceId) -> Vec<Volume> {
        self.lock().volumes.get(namespace).cloned().unwrap_or_default()
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.lock().nodes.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call, then apply queued failures and the context
    fn begin(&self, ctx: &RequestContext, op: &'static str) -> Result<MutexGuard<'_, FakeState>> {
        let mut state = self.lock();
        *state.calls.entry(op).or_default() += 1;
        if let Some(err) = state.failures.get_mut(op).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        ctx.check()?;
        Ok(state)
    }

    /// As [`Self::begin`], additionally requiring a live session
    fn authorised(
        &self,
        ctx: &RequestContext,
        op: &'static str,
    ) -> Result<MutexGuard<'_, FakeState>> {
        let state = self.begin(ctx, op)?;
        let live = match &state.active_token {
            Some(token) => state.valid_tokens.contains(token),
            None => return Err(ApiError::AuthenticationRequired("no session".into())),
        };
        if !live {
            return Err(ApiError::AuthenticationRequired("session expired".into()));
        }
        Ok(state)
    }
}

fn find<R: Resource + Clone>(items: &[R], id: &R::Id) -> Result<R> {
    items
        .iter()
        .find(|item| item.id() == id)
        .cloned()
        .ok_or_else(|| ApiError::not_found_id(R::KIND, id))
}

fn remove<R: Resource>(items: &mut Vec<R>, id: &R::Id, version: Option<&Version>) -> Result<()> {
    let index = items
        .iter()
        .position(|item| item.id() == id)
        .ok_or_else(|| ApiError::not_found_id(R::KIND, id))?;
    check_version(items[index].version(), version)?;
    items.remove(index);
    Ok(())
}

fn check_version(current: &Version, expected: Option<&Version>) -> Result<()> {
    match expected {
        Some(expected) if expected != current => Err(ApiError::StaleWrite(format!(
            "version {expected} does not match current version {current}"
        ))),
        _ => Ok(()),
    }
}

fn bump(version: &Version) -> Version {
    let next = version.as_str().parse::<u64>().map_or(1, |v| v + 1);
    Version::new(next.to_string())
}

fn ensure_unique<'a>(
    kind: ResourceKind,
    mut names: impl Iterator<Item = &'a str>,
    name: &str,
) -> Result<()> {
    if names.any(|existing| existing == name) {
        return Err(ApiError::Conflict(format!("{kind} with name \"{name}\" already exists")));
    }
    Ok(())
}

#[async_trait]
impl Transport for FakeTransport {
    async fn authenticate(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> Result<AuthSession> {
        let mut state = self.begin(ctx, "authenticate")?;
        if state.credentials.get(username).map(String::as_str) != Some(password) {
            return Err(ApiError::AuthenticationRequired("invalid username or password".into()));
        }
        let session = state.issue();
        state.active_token = Some(session.token().to_string());
        if let Some(ctx) = state.cancel_on_login.take() {
            ctx.cancel();
        }
        Ok(session)
    }

    async fn use_session(&self, ctx: &RequestContext, session: &AuthSession) -> Result<()> {
        let mut state = self.begin(ctx, "use_session")?;
        state.active_token = Some(session.token().to_string());
        Ok(())
    }

    async fn get_cluster(&self, ctx: &RequestContext) -> Result<Cluster> {
        let state = self.authorised(ctx, "get_cluster")?;
        state.cluster.clone().ok_or_else(|| ApiError::NotFound("cluster not configured".into()))
    }

    async fn update_cluster(
        &self,
        ctx: &RequestContext,
        params: &UpdateClusterParams,
    ) -> Result<Cluster> {
        let mut state = self.authorised(ctx, "update_cluster")?;
        let cluster = state
            .cluster
            .as_mut()
            .ok_or_else(|| ApiError::NotFound("cluster not configured".into()))?;
        check_version(&cluster.version, Some(&params.version))?;
        cluster.disable_telemetry = params.disable_telemetry;
        cluster.disable_crash_reporting = params.disable_crash_reporting;
        cluster.disable_version_check = params.disable_version_check;
        cluster.log_level.clone_from(&params.log_level);
        cluster.log_format.clone_from(&params.log_format);
        cluster.updated_at = Utc::now();
        cluster.version = bump(&cluster.version);
        Ok(cluster.clone())
    }

    async fn get_node(&self, ctx: &RequestContext, id: &NodeId) -> Result<Node> {
        let state = self.authorised(ctx, "get_node")?;
        find(&state.nodes, id)
    }

    async fn list_nodes(&self, ctx: &RequestContext) -> Result<Vec<Node>> {
        let state = self.authorised(ctx, "list_nodes")?;
        Ok(state.nodes.clone())
    }

    async fn delete_node(
        &self,
        ctx: &RequestContext,
        id: &NodeId,
        version: Option<&Version>,
    ) -> Result<()> {
        let mut state = self.authorised(ctx, "delete_node")?;
        remove(&mut state.nodes, id, version)
    }

    async fn get_namespace(&self, ctx: &RequestContext, id: &NamespaceId) -> Result<Namespace> {
        let state = self.authorised(ctx, "get_namespace")?;
        find(&state.namespaces, id)
    }

    async fn list_namespaces(&self, ctx: &RequestContext) -> Result<Vec<Namespace>> {
        let state = self.authorised(ctx, "list_namespaces")?;
        Ok(state.namespaces.clone())
    }

    async fn create_namespace(
        &self,
        ctx: &RequestContext,
        params: &CreateNamespaceParams,
    ) -> Result<Namespace> {
        let mut state = self.authorised(ctx, "create_namespace")?;
        ensure_unique(
            ResourceKind::Namespace,
            state.namespaces.iter().map(|ns| ns.name.as_str()),
            &params.name,
        )?;
        let now = Utc::now();
        let namespace = Namespace {
            id: NamespaceId::new(state.next_id("ns")),
            name: params.name.clone(),
            labels: params.labels.clone(),
            created_at: now,
            updated_at: now,
            version: Version::new("1"),
        };
        state.volumes.insert(namespace.id.clone(), Vec::new());
        state.namespaces.push(namespace.clone());
        Ok(namespace)
    }

    async fn delete_namespace(
        &self,
        ctx: &RequestContext,
        id: &NamespaceId,
        version: Option<&Version>,
    ) -> Result<()> {
        let mut state = self.authorised(ctx, "delete_namespace")?;
        remove(&mut state.namespaces, id, version)?;
        state.volumes.remove(id);
        Ok(())
    }

    async fn get_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
    ) -> Result<Volume> {
        let mut state = self.authorised(ctx, "get_volume")?;
        find(state.namespace_volumes(namespace)?, id)
    }

    async fn list_volumes(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
    ) -> Result<Vec<Volume>> {
        let mut state = self.authorised(ctx, "list_volumes")?;
        if state.denied_namespaces.contains(namespace) {
            return Err(ApiError::Unauthorised(format!(
                "no access to volumes in namespace \"{namespace}\""
            )));
        }
        Ok(state.namespace_volumes(namespace)?.clone())
    }

    async fn create_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        params: &CreateVolumeParams,
    ) -> Result<Volume> {
        let mut state = self.authorised(ctx, "create_volume")?;
        let id = VolumeId::new(state.next_id("vol"));
        let volumes = state.namespace_volumes(namespace)?;
        ensure_unique(
            ResourceKind::Volume,
            volumes.iter().map(|v| v.name.as_str()),
            &params.name,
        )?;
        let now = Utc::now();
        let volume = Volume {
            id,
            name: params.name.clone(),
            description: params.description.clone(),
            namespace_id: namespace.clone(),
            size_bytes: params.size_bytes,
            fs_type: params.fs_type.clone(),
            health: storectl_domain::Health::Online,
            labels: params.labels.clone(),
            attached_on: None,
            created_at: now,
            updated_at: now,
            version: Version::new("1"),
        };
        volumes.push(volume.clone());
        Ok(volume)
    }

    async fn delete_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        version: Option<&Version>,
    ) -> Result<()> {
        let mut state = self.authorised(ctx, "delete_volume")?;
        remove(state.namespace_volumes(namespace)?, id, version)
    }

    async fn attach_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        node: &NodeId,
    ) -> Result<()> {
        let mut state = self.authorised(ctx, "attach_volume")?;
        if !state.nodes.iter().any(|n| &n.id == node) {
            return Err(ApiError::not_found_id(ResourceKind::Node, node));
        }
        let volume = state
            .namespace_volumes(namespace)?
            .iter_mut()
            .find(|v| &v.id == id)
            .ok_or_else(|| ApiError::not_found_id(ResourceKind::Volume, id))?;
        if volume.is_attached() {
            return Err(ApiError::InvalidStateTransition(format!(
                "volume \"{id}\" is already attached"
            )));
        }
        volume.attached_on = Some(node.clone());
        volume.version = bump(&volume.version);
        Ok(())
    }

    async fn detach_volume(
        &self,
        ctx: &RequestContext,
        namespace: &NamespaceId,
        id: &VolumeId,
        version: Option<&Version>,
    ) -> Result<()> {
        let mut state = self.authorised(ctx, "detach_volume")?;
        let volume = state
            .namespace_volumes(namespace)?
            .iter_mut()
            .find(|v| &v.id == id)
            .ok_or_else(|| ApiError::not_found_id(ResourceKind::Volume, id))?;
        check_version(&volume.version, version)?;
        if !volume.is_attached() {
            return Err(ApiError::InvalidStateTransition(format!(
                "volume \"{id}\" is not attached"
            )));
        }
        volume.attached_on = None;
        volume.version = bump(&volume.version);
        Ok(())
    }

    async fn get_user(&self, ctx: &RequestContext, id: &UserId) -> Result<User> {
        let state = self.authorised(ctx, "get_user")?;
        find(&state.users, id)
    }

    async fn list_users(&self, ctx: &RequestContext) -> Result<Vec<User>> {
        let state = self.authorised(ctx, "list_users")?;
        Ok(state.users.clone())
    }

    async fn create_user(&self, ctx: &RequestContext, params: &CreateUserParams) -> Result<User> {
        let mut state = self.authorised(ctx, "create_user")?;
        ensure_unique(
            ResourceKind::User,
            state.users.iter().map(|u| u.username.as_str()),
            &params.username,
        )?;
        let now = Utc::now();
        let user = User {
            id: UserId::new(state.next_id("user")),
            username: params.username.clone(),
            is_admin: params.with_admin,
            groups: params.groups.clone(),
            created_at: now,
            updated_at: now,
            version: Version::new("1"),
        };
        state.credentials.insert(params.username.clone(), params.password.clone());
        state.users.push(user.clone());
        Ok(user)
    }

    async fn delete_user(
        &self,
        ctx: &RequestContext,
        id: &UserId,
        version: Option<&Version>,
    ) -> Result<()> {
        let mut state = self.authorised(ctx, "delete_user")?;
        remove(&mut state.users, id, version)
    }

    async fn get_policy_group(
        &self,
        ctx: &RequestContext,
        id: &PolicyGroupId,
    ) -> Result<PolicyGroup> {
        let state = self.authorised(ctx, "get_policy_group")?;
        find(&state.policy_groups, id)
    }

    async fn list_policy_groups(&self, ctx: &RequestContext) -> Result<Vec<PolicyGroup>> {
        let state = self.authorised(ctx, "list_policy_groups")?;
        Ok(state.policy_groups.clone())
    }

    async fn create_policy_group(
        &self,
        ctx: &RequestContext,
        params: &CreatePolicyGroupParams,
    ) -> Result<PolicyGroup> {
        let mut state = self.authorised(ctx, "create_policy_group")?;
        ensure_unique(
            ResourceKind::PolicyGroup,
            state.policy_groups.iter().map(|g| g.name.as_str()),
            &params.name,
        )?;
        let now = Utc::now();
        let group = PolicyGroup {
            id: PolicyGroupId::new(state.next_id("pg")),
            name: params.name.clone(),
            users: Vec::new(),
            specs: params.specs.clone(),
            created_at: now,
            updated_at: now,
            version: Version::new("1"),
        };
        state.policy_groups.push(group.clone());
        Ok(group)
    }

    async fn delete_policy_group(
        &self,
        ctx: &RequestContext,
        id: &PolicyGroupId,
        version: Option<&Version>,
    ) -> Result<()> {
        let mut state = self.authorised(ctx, "delete_policy_group")?;
        remove(&mut state.policy_groups, id, version)
    }
}

/// In-memory [`AuthCache`] with switchable failures
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, AuthSession>>,
    fail_gets: AtomicBool,
    fail_puts: AtomicBool,
    gets: AtomicUsize,
    puts: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, username: &str, session: AuthSession) {
        self.lock().insert(username.into(), session);
    }

    /// Read an entry without counting a lookup
    pub fn peek(&self, username: &str) -> Option<AuthSession> {
        self.lock().get(username).cloned()
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, AuthSession>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AuthCache for MemoryCache {
    async fn get(&self, username: &str) -> Result<Option<AuthSession>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(ApiError::Unknown("cache unavailable".into()));
        }
        Ok(self.lock().get(username).cloned())
    }

    async fn put(&self, username: &str, session: &AuthSession) -> Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(ApiError::Unknown("cache unavailable".into()));
        }
        self.lock().insert(username.into(), session.clone());
        Ok(())
    }
}
