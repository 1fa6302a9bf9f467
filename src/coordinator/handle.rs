use crate::context::RequestContext;
use crate::error::Result;
use crate::proto::ComponentStates;

/// Client-side proxy to an upstream coordination service
#[async_trait::async_trait]
pub trait DependencyHandle: Send + Sync {
    /// Name used in logs and startup errors
    fn name(&self) -> &str;

    async fn init(&self) -> Result<()>;

    async fn start(&self) -> Result<()>;

    /// Register with the cluster metadata store
    async fn register(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    async fn get_component_states(&self, ctx: &RequestContext) -> Result<ComponentStates>;
}
