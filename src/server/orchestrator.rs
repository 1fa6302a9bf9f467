use crate::config::NodeConfig;
use crate::coordinator::{DependencyHandle, HealthWaitPolicy, LocalCoordinator};
use crate::engine::{LocalQueryEngine, QueryEngine};
use crate::error::{NodeError, Result};
use crate::proto::StateCode;
use crate::session::SessionRegistry;
use crate::state::StateRegister;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub const SERVER_ROLE: &str = "querynode";

/// Lifecycle front of a query node: brings up the coordinators and the
/// engine in order and forwards data-plane calls to the engine.
pub struct Server {
    pub(super) node_id: i64,

    // Components
    pub(super) engine: Arc<dyn QueryEngine>,
    pub(super) primary: Arc<dyn DependencyHandle>,
    pub(super) secondary: Arc<dyn DependencyHandle>,

    // Lifecycle management
    pub(super) state: StateRegister,
    pub(super) wait_policy: HealthWaitPolicy,
    pub(super) cancellation_token: CancellationToken,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Create a server whose coordinators and engine all live in this process
    pub fn standalone(config: &NodeConfig) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let address = config.node.address();

        let primary = LocalCoordinator::new(
            config.primary_coordinator.role.as_str(),
            config.primary_coordinator.server_id,
            config.primary_coordinator.address.as_str(),
            Arc::clone(&registry),
        );
        let secondary = LocalCoordinator::new(
            config.secondary_coordinator.role.as_str(),
            config.secondary_coordinator.server_id,
            config.secondary_coordinator.address.as_str(),
            Arc::clone(&registry),
        );
        let engine = LocalQueryEngine::new(
            config.node.node_id,
            address.as_str(),
            config.engine.clone(),
            registry,
        );

        info!(
            "Created standalone query node {} at {} ({} + {})",
            config.node.node_id,
            address,
            config.primary_coordinator.role,
            config.secondary_coordinator.role
        );

        Self {
            node_id: config.node.node_id,
            engine: Arc::new(engine),
            primary: Arc::new(primary),
            secondary: Arc::new(secondary),
            state: StateRegister::new(SERVER_ROLE),
            wait_policy: config.dependency_wait.policy(),
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn node_id(&self) -> i64 {
        self.node_id
    }

    /// Current state of the node, without consulting any dependency
    pub fn state(&self) -> StateCode {
        self.state.get()
    }

    pub fn primary(&self) -> &Arc<dyn DependencyHandle> {
        &self.primary
    }

    pub fn secondary(&self) -> &Arc<dyn DependencyHandle> {
        &self.secondary
    }

    /// Abandon a dependency health wait that is still in progress
    pub fn cancel_startup(&self) {
        self.cancellation_token.cancel();
    }
}

/// Builder for [`Server`]
pub struct ServerBuilder {
    node_id: Option<i64>,
    engine: Option<Arc<dyn QueryEngine>>,
    primary: Option<Arc<dyn DependencyHandle>>,
    secondary: Option<Arc<dyn DependencyHandle>>,
    wait_policy: HealthWaitPolicy,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            node_id: None,
            engine: None,
            primary: None,
            secondary: None,
            wait_policy: HealthWaitPolicy::default(),
        }
    }

    pub fn node_id(mut self, node_id: i64) -> Self {
        self.node_id = Some(node_id);
        self
    }

    pub fn engine(mut self, engine: Arc<dyn QueryEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn primary(mut self, primary: Arc<dyn DependencyHandle>) -> Self {
        self.primary = Some(primary);
        self
    }

    pub fn secondary(mut self, secondary: Arc<dyn DependencyHandle>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn wait_policy(mut self, wait_policy: HealthWaitPolicy) -> Self {
        self.wait_policy = wait_policy;
        self
    }

    pub fn build(self) -> Result<Server> {
        let node_id = self
            .node_id
            .ok_or_else(|| NodeError::system("Node id must be specified"))?;
        let engine = self
            .engine
            .ok_or_else(|| NodeError::system("Query engine must be specified"))?;
        let primary = self
            .primary
            .ok_or_else(|| NodeError::system("Primary coordinator must be specified"))?;
        let secondary = self
            .secondary
            .ok_or_else(|| NodeError::system("Secondary coordinator must be specified"))?;

        Ok(Server {
            node_id,
            engine,
            primary,
            secondary,
            state: StateRegister::new(SERVER_ROLE),
            wait_policy: self.wait_policy,
            cancellation_token: CancellationToken::new(),
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
