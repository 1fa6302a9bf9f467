use super::DependencyHandle;
use crate::context::RequestContext;
use crate::error::{NodeError, Result};
use crate::proto::{ComponentStates, StateCode};
use crate::session::SessionRegistry;
use crate::state::StateRegister;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Coordinator running inside the node's own process (standalone mode)
pub struct LocalCoordinator {
    role: String,
    server_id: i64,
    address: String,
    state: StateRegister,
    initialized: AtomicBool,
    registry: Arc<SessionRegistry>,
}

impl LocalCoordinator {
    pub fn new<R: Into<String>, A: Into<String>>(
        role: R,
        server_id: i64,
        address: A,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            role: role.into(),
            server_id,
            address: address.into(),
            state: StateRegister::new("coordinator"),
            initialized: AtomicBool::new(false),
            registry,
        }
    }

    pub fn state(&self) -> StateCode {
        self.state.get()
    }
}

#[async_trait::async_trait]
impl DependencyHandle for LocalCoordinator {
    fn name(&self) -> &str {
        &self.role
    }

    async fn init(&self) -> Result<()> {
        info!("Initializing {} at {}", self.role, self.address);
        self.state.set(StateCode::Initializing);
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(NodeError::not_ready(&self.role, "start called before init"));
        }
        self.state.set(StateCode::Healthy);
        info!("{} started", self.role);
        Ok(())
    }

    async fn register(&self) -> Result<()> {
        if !self.state.is_healthy() {
            return Err(NodeError::not_ready(
                &self.role,
                "register called before start",
            ));
        }
        self.registry
            .register(&self.role, self.server_id, &self.address)?;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.state.set(StateCode::Abnormal);
        self.registry.deregister(&self.role, self.server_id);
        info!("{} stopped", self.role);
        Ok(())
    }

    async fn get_component_states(&self, _ctx: &RequestContext) -> Result<ComponentStates> {
        Ok(ComponentStates::new(
            self.server_id,
            self.role.as_str(),
            self.state.get(),
        ))
    }
}
