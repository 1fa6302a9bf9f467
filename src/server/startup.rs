use super::Server;
use crate::context::RequestContext;
use crate::coordinator::{wait_for_component_healthy, DependencyHandle};
use crate::engine::Dependencies;
use crate::error::{FatalStartupError, NodeError, RunError, StartupStage, EXIT_FATAL_STARTUP};
use crate::proto::StateCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

impl Server {
    /// Bring the node up.
    ///
    /// Coordinators are started first, primary then secondary; any failure
    /// there is returned as [`RunError::Fatal`] and the process must exit.
    /// Engine failures come back as [`RunError::Engine`] and leave the node
    /// in `Initializing`.
    pub async fn run(&self) -> Result<(), RunError> {
        info!("Starting query node {}", self.node_id);

        self.start_dependency(&self.primary).await?;
        self.start_dependency(&self.secondary).await?;

        let dependencies = Dependencies::new(&self.primary, &self.secondary);
        self.engine.wire(dependencies).await.map_err(|e| {
            error!("Failed to wire dependencies into the engine: {}", e);
            FatalStartupError::new("engine", StartupStage::Wire, e)
        })?;

        self.engine.init().await.map_err(|e| {
            error!("Query engine init failed: {}", e);
            RunError::Engine {
                stage: StartupStage::Init,
                source: e,
            }
        })?;

        self.engine.start().await.map_err(|e| {
            error!("Query engine start failed: {}", e);
            RunError::Engine {
                stage: StartupStage::Start,
                source: e,
            }
        })?;

        self.engine.register().await.map_err(|e| {
            error!("Query engine register failed: {}", e);
            RunError::Engine {
                stage: StartupStage::Register,
                source: e,
            }
        })?;

        if self
            .state
            .transition(StateCode::Initializing, StateCode::Healthy)
        {
            info!("Query node {} is healthy", self.node_id);
        } else {
            warn!(
                "Query node {} already left Initializing (now {})",
                self.node_id,
                self.state.get()
            );
        }
        Ok(())
    }

    /// Run the node and decide whether the process has to exit.
    ///
    /// Returns `None` once the node is serving. A fatal startup error maps to
    /// [`EXIT_FATAL_STARTUP`] without touching the engine; an engine failure
    /// stops the engine within `stop_limit` first.
    pub async fn run_or_exit_code(&self, stop_limit: Duration) -> Option<i32> {
        match self.run().await {
            Ok(()) => None,
            Err(RunError::Fatal(e)) => {
                error!("Fatal startup error, exiting: {}", e);
                Some(EXIT_FATAL_STARTUP)
            }
            Err(e) => {
                error!("Query node failed to start: {}", e);
                let exit_code = e.exit_code();
                self.shutdown(stop_limit).await;
                Some(exit_code)
            }
        }
    }

    /// Init, start, wait for health and register one coordinator
    async fn start_dependency(
        &self,
        handle: &Arc<dyn DependencyHandle>,
    ) -> Result<(), FatalStartupError> {
        let name = handle.name().to_string();
        let fatal = |stage: StartupStage| {
            let name = name.clone();
            move |e: NodeError| {
                error!("Dependency {} failed during {}: {}", name, stage, e);
                FatalStartupError::new(name, stage, e)
            }
        };

        info!("Initializing dependency {}", name);
        handle.init().await.map_err(fatal(StartupStage::Init))?;

        info!("Starting dependency {}", name);
        handle.start().await.map_err(fatal(StartupStage::Start))?;

        let ctx = RequestContext::with_cancellation(self.cancellation_token.child_token());
        wait_for_component_healthy(&**handle, &ctx, self.wait_policy)
            .await
            .map_err(fatal(StartupStage::WaitHealthy))?;

        handle.register().await.map_err(fatal(StartupStage::Register))?;

        info!("Dependency {} is ready", name);
        Ok(())
    }
}
