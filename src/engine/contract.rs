use crate::context::RequestContext;
use crate::coordinator::DependencyHandle;
use crate::error::Result;
use crate::proto::{
    AddQueryChannelRequest, ComponentStates, GetMetricsRequest, GetMetricsResponse,
    GetSegmentInfoRequest, GetSegmentInfoResponse, LoadSegmentsRequest, ReleaseCollectionRequest,
    ReleasePartitionsRequest, ReleaseSegmentsRequest, RemoveQueryChannelRequest, Status,
    StringResponse, WatchDeltaChannelsRequest, WatchDmChannelsRequest,
};
use std::sync::{Arc, Weak};

/// Non-owning references to the node's coordinators.
///
/// The server keeps the owning `Arc`s; an engine upgrades these at call
/// time and must treat a dropped coordinator as unavailable.
#[derive(Clone)]
pub struct Dependencies {
    pub primary: Weak<dyn DependencyHandle>,
    pub secondary: Weak<dyn DependencyHandle>,
}

impl Dependencies {
    pub fn new(primary: &Arc<dyn DependencyHandle>, secondary: &Arc<dyn DependencyHandle>) -> Self {
        Self {
            primary: Arc::downgrade(primary),
            secondary: Arc::downgrade(secondary),
        }
    }

    pub fn primary(&self) -> Option<Arc<dyn DependencyHandle>> {
        self.primary.upgrade()
    }

    pub fn secondary(&self) -> Option<Arc<dyn DependencyHandle>> {
        self.secondary.upgrade()
    }
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = |handle: Option<Arc<dyn DependencyHandle>>| {
            handle
                .map(|h| h.name().to_string())
                .unwrap_or_else(|| "<dropped>".to_string())
        };
        f.debug_struct("Dependencies")
            .field("primary", &name(self.primary()))
            .field("secondary", &name(self.secondary()))
            .finish()
    }
}

/// The node's data-plane engine.
///
/// Construction is two-phase: build the engine, then `wire` it with its
/// dependencies before `init`/`start`. Data-plane calls made before
/// `wire` and `start` have completed must answer with a
/// `NotReadyServe` status.
///
/// Logical failures of data-plane calls are reported in the returned
/// `Status`; `Err` is reserved for failures to produce a response at all.
#[async_trait::async_trait]
pub trait QueryEngine: Send + Sync {
    async fn wire(&self, dependencies: Dependencies) -> Result<()>;

    async fn init(&self) -> Result<()>;

    async fn start(&self) -> Result<()>;

    async fn register(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    async fn get_component_states(&self, ctx: &RequestContext) -> Result<ComponentStates>;

    async fn get_statistics_channel(&self, ctx: &RequestContext) -> Result<StringResponse>;

    async fn get_time_tick_channel(&self, ctx: &RequestContext) -> Result<StringResponse>;

    async fn add_query_channel(
        &self,
        ctx: &RequestContext,
        req: AddQueryChannelRequest,
    ) -> Result<Status>;

    async fn remove_query_channel(
        &self,
        ctx: &RequestContext,
        req: RemoveQueryChannelRequest,
    ) -> Result<Status>;

    async fn watch_dm_channels(
        &self,
        ctx: &RequestContext,
        req: WatchDmChannelsRequest,
    ) -> Result<Status>;

    async fn watch_delta_channels(
        &self,
        ctx: &RequestContext,
        req: WatchDeltaChannelsRequest,
    ) -> Result<Status>;

    async fn load_segments(&self, ctx: &RequestContext, req: LoadSegmentsRequest)
        -> Result<Status>;

    async fn release_collection(
        &self,
        ctx: &RequestContext,
        req: ReleaseCollectionRequest,
    ) -> Result<Status>;

    async fn release_partitions(
        &self,
        ctx: &RequestContext,
        req: ReleasePartitionsRequest,
    ) -> Result<Status>;

    async fn release_segments(
        &self,
        ctx: &RequestContext,
        req: ReleaseSegmentsRequest,
    ) -> Result<Status>;

    async fn get_segment_info(
        &self,
        ctx: &RequestContext,
        req: GetSegmentInfoRequest,
    ) -> Result<GetSegmentInfoResponse>;

    async fn get_metrics(
        &self,
        ctx: &RequestContext,
        req: GetMetricsRequest,
    ) -> Result<GetMetricsResponse>;
}
