//! Data-plane surface of the node.
//!
//! Every call except `get_component_states` is handed to the engine as-is
//! and its result returned as-is.

use super::orchestrator::SERVER_ROLE;
use super::Server;
use crate::context::RequestContext;
use crate::error::Result;
use crate::proto::{
    AddQueryChannelRequest, ComponentStates, GetComponentStatesRequest, GetMetricsRequest,
    GetMetricsResponse, GetSegmentInfoRequest, GetSegmentInfoResponse,
    GetStatisticsChannelRequest, GetTimeTickChannelRequest, LoadSegmentsRequest,
    ReleaseCollectionRequest, ReleasePartitionsRequest, ReleaseSegmentsRequest,
    RemoveQueryChannelRequest, Status, StringResponse, WatchDeltaChannelsRequest,
    WatchDmChannelsRequest,
};

impl Server {
    /// Report this node's own state; never waits on a dependency
    pub async fn get_component_states(
        &self,
        _ctx: &RequestContext,
        _req: GetComponentStatesRequest,
    ) -> Result<ComponentStates> {
        Ok(ComponentStates::new(
            self.node_id,
            SERVER_ROLE,
            self.state.get(),
        ))
    }

    pub async fn get_statistics_channel(
        &self,
        ctx: &RequestContext,
        _req: GetStatisticsChannelRequest,
    ) -> Result<StringResponse> {
        // The request has no fields; the engine only needs the context
        self.engine.get_statistics_channel(ctx).await
    }

    pub async fn get_time_tick_channel(
        &self,
        ctx: &RequestContext,
        _req: GetTimeTickChannelRequest,
    ) -> Result<StringResponse> {
        // The request has no fields; the engine only needs the context
        self.engine.get_time_tick_channel(ctx).await
    }

    pub async fn add_query_channel(
        &self,
        ctx: &RequestContext,
        req: AddQueryChannelRequest,
    ) -> Result<Status> {
        self.engine.add_query_channel(ctx, req).await
    }

    pub async fn remove_query_channel(
        &self,
        ctx: &RequestContext,
        req: RemoveQueryChannelRequest,
    ) -> Result<Status> {
        self.engine.remove_query_channel(ctx, req).await
    }

    pub async fn watch_dm_channels(
        &self,
        ctx: &RequestContext,
        req: WatchDmChannelsRequest,
    ) -> Result<Status> {
        self.engine.watch_dm_channels(ctx, req).await
    }

    pub async fn watch_delta_channels(
        &self,
        ctx: &RequestContext,
        req: WatchDeltaChannelsRequest,
    ) -> Result<Status> {
        self.engine.watch_delta_channels(ctx, req).await
    }

    pub async fn load_segments(
        &self,
        ctx: &RequestContext,
        req: LoadSegmentsRequest,
    ) -> Result<Status> {
        self.engine.load_segments(ctx, req).await
    }

    pub async fn release_collection(
        &self,
        ctx: &RequestContext,
        req: ReleaseCollectionRequest,
    ) -> Result<Status> {
        self.engine.release_collection(ctx, req).await
    }

    pub async fn release_partitions(
        &self,
        ctx: &RequestContext,
        req: ReleasePartitionsRequest,
    ) -> Result<Status> {
        self.engine.release_partitions(ctx, req).await
    }

    pub async fn release_segments(
        &self,
        ctx: &RequestContext,
        req: ReleaseSegmentsRequest,
    ) -> Result<Status> {
        self.engine.release_segments(ctx, req).await
    }

    pub async fn get_segment_info(
        &self,
        ctx: &RequestContext,
        req: GetSegmentInfoRequest,
    ) -> Result<GetSegmentInfoResponse> {
        self.engine.get_segment_info(ctx, req).await
    }

    pub async fn get_metrics(
        &self,
        ctx: &RequestContext,
        req: GetMetricsRequest,
    ) -> Result<GetMetricsResponse> {
        self.engine.get_metrics(ctx, req).await
    }
}
