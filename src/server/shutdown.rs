use super::Server;
use crate::error::{Result, EXIT_SHUTDOWN_FAILURE};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

impl Server {
    /// Stop the engine. Coordinators are left running.
    ///
    /// The engine's error is returned unchanged.
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping query node {}", self.node_id);
        self.engine.stop().await
    }

    /// Stop the engine, giving up after `limit`. Returns the process exit code.
    pub async fn shutdown(&self, limit: Duration) -> i32 {
        info!("Beginning graceful shutdown");

        let exit_code = match timeout(limit, self.stop()).await {
            Ok(Ok(())) => {
                info!("Query engine stopped");
                0
            }
            Ok(Err(e)) => {
                error!("Error stopping query engine: {}", e);
                EXIT_SHUTDOWN_FAILURE
            }
            Err(_) => {
                error!("Query engine stop timeout after {:?}", limit);
                EXIT_SHUTDOWN_FAILURE
            }
        };

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        exit_code
    }
}
