use super::metrics::{self, SystemInfoMetrics, SYSTEM_INFO_METRICS};
use super::{Dependencies, QueryEngine};
use crate::config::EngineConfig;
use crate::context::RequestContext;
use crate::error::{NodeError, Result};
use crate::proto::{
    AddQueryChannelRequest, ComponentStates, ErrorCode, GetMetricsRequest, GetMetricsResponse,
    GetSegmentInfoRequest, GetSegmentInfoResponse, LoadSegmentsRequest, ReleaseCollectionRequest,
    ReleasePartitionsRequest, ReleaseSegmentsRequest, RemoveQueryChannelRequest, SegmentInfo,
    SegmentState, StateCode, Status, StringResponse, UniqueId, WatchDeltaChannelsRequest,
    WatchDmChannelsRequest,
};
use crate::session::SessionRegistry;
use crate::state::StateRegister;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const QUERY_NODE_ROLE: &str = "querynode";

#[derive(Debug, Default)]
struct CollectionState {
    /// query channel -> query result channel
    query_channels: HashMap<String, String>,
    dm_channels: BTreeSet<String>,
    delta_channels: BTreeSet<String>,
    partitions: BTreeSet<UniqueId>,
    segments: BTreeMap<UniqueId, SegmentInfo>,
}

/// In-memory engine that tracks channel and segment assignments
pub struct LocalQueryEngine {
    node_id: i64,
    address: String,
    config: EngineConfig,
    state: StateRegister,
    initialized: AtomicBool,
    dependencies: RwLock<Option<Dependencies>>,
    collections: RwLock<HashMap<UniqueId, CollectionState>>,
    started_at: RwLock<Option<DateTime<Utc>>>,
    registry: Arc<SessionRegistry>,
}

impl LocalQueryEngine {
    pub fn new<A: Into<String>>(
        node_id: i64,
        address: A,
        config: EngineConfig,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            node_id,
            address: address.into(),
            config,
            state: StateRegister::new(QUERY_NODE_ROLE),
            initialized: AtomicBool::new(false),
            dependencies: RwLock::new(None),
            collections: RwLock::new(HashMap::new()),
            started_at: RwLock::new(None),
            registry,
        }
    }

    pub fn state(&self) -> StateCode {
        self.state.get()
    }

    /// Status to answer with instead of serving, if any
    fn refuse(&self, ctx: &RequestContext) -> Option<Status> {
        if ctx.is_done() {
            return Some(Status::unexpected("request cancelled or deadline exceeded"));
        }
        let state = self.state.get();
        if state != StateCode::Healthy {
            return Some(Status::error(
                ErrorCode::NotReadyServe,
                format!("query node {} is not ready, state: {}", self.node_id, state),
            ));
        }
        None
    }

    fn check_node(&self, node_id: UniqueId) -> Option<Status> {
        if node_id != 0 && node_id != self.node_id {
            return Some(Status::error(
                ErrorCode::IllegalArgument,
                format!(
                    "request addressed to node {}, this is node {}",
                    node_id, self.node_id
                ),
            ));
        }
        None
    }

    fn dependency_names(&self) -> Vec<String> {
        let dependencies = self.dependencies.read();
        let Some(deps) = dependencies.as_ref() else {
            return Vec::new();
        };
        [deps.primary(), deps.secondary()]
            .into_iter()
            .flatten()
            .map(|handle| handle.name().to_string())
            .collect()
    }

    fn system_info(&self) -> SystemInfoMetrics {
        let collections = self.collections.read();
        let mut info = SystemInfoMetrics {
            name: metrics::component_name(QUERY_NODE_ROLE, self.node_id),
            node_id: self.node_id,
            address: self.address.clone(),
            state: self.state.get(),
            started_at: *self.started_at.read(),
            dependencies: self.dependency_names(),
            collections: collections.len(),
            partitions: 0,
            segments: 0,
            total_rows: 0,
            total_mem_size: 0,
            dm_channels: 0,
            delta_channels: 0,
            query_channels: 0,
        };
        for collection in collections.values() {
            info.partitions += collection.partitions.len();
            info.segments += collection.segments.len();
            info.dm_channels += collection.dm_channels.len();
            info.delta_channels += collection.delta_channels.len();
            info.query_channels += collection.query_channels.len();
            for segment in collection.segments.values() {
                info.total_rows = info.total_rows.saturating_add(segment.num_rows);
                info.total_mem_size = info.total_mem_size.saturating_add(segment.mem_size);
            }
        }
        info
    }
}

#[async_trait::async_trait]
impl QueryEngine for LocalQueryEngine {
    async fn wire(&self, dependencies: Dependencies) -> Result<()> {
        if self.state.is_healthy() {
            return Err(NodeError::component(
                QUERY_NODE_ROLE,
                "dependencies cannot be rewired while serving",
            ));
        }
        if dependencies.primary().is_none() || dependencies.secondary().is_none() {
            return Err(NodeError::component(
                QUERY_NODE_ROLE,
                "dependency handle dropped before wiring",
            ));
        }
        debug!("Query node {} wired with {:?}", self.node_id, dependencies);
        *self.dependencies.write() = Some(dependencies);
        Ok(())
    }

    async fn init(&self) -> Result<()> {
        let dependencies = self.dependencies.read().clone();
        let Some(dependencies) = dependencies else {
            return Err(NodeError::not_ready(
                QUERY_NODE_ROLE,
                "init called before dependencies were wired",
            ));
        };
        for handle in [dependencies.primary(), dependencies.secondary()] {
            let Some(handle) = handle else {
                return Err(NodeError::component(
                    QUERY_NODE_ROLE,
                    "dependency handle dropped",
                ));
            };
            let states = handle.get_component_states(&RequestContext::new()).await?;
            if !states.is_healthy() {
                return Err(NodeError::component(
                    QUERY_NODE_ROLE,
                    format!(
                        "dependency {} is {}",
                        handle.name(),
                        states.state.state_code
                    ),
                ));
            }
        }

        self.state.set(StateCode::Initializing);
        self.initialized.store(true, Ordering::Release);
        info!("Query node {} initialized", self.node_id);
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(NodeError::not_ready(
                QUERY_NODE_ROLE,
                "start called before init",
            ));
        }
        *self.started_at.write() = Some(Utc::now());
        self.state.set(StateCode::Healthy);
        info!("Query node {} started", self.node_id);
        Ok(())
    }

    async fn register(&self) -> Result<()> {
        if !self.state.is_healthy() {
            return Err(NodeError::not_ready(
                QUERY_NODE_ROLE,
                "register called before start",
            ));
        }
        self.registry
            .register(QUERY_NODE_ROLE, self.node_id, &self.address)?;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.state.set(StateCode::Abnormal);
        self.initialized.store(false, Ordering::Release);
        self.collections.write().clear();
        self.registry.deregister(QUERY_NODE_ROLE, self.node_id);
        info!("Query node {} stopped", self.node_id);
        Ok(())
    }

    async fn get_component_states(&self, _ctx: &RequestContext) -> Result<ComponentStates> {
        Ok(ComponentStates::new(
            self.node_id,
            QUERY_NODE_ROLE,
            self.state.get(),
        ))
    }

    async fn get_statistics_channel(&self, ctx: &RequestContext) -> Result<StringResponse> {
        if let Some(status) = self.refuse(ctx) {
            return Ok(StringResponse::failed(status));
        }
        Ok(StringResponse::ok(self.config.stats_channel.as_str()))
    }

    async fn get_time_tick_channel(&self, ctx: &RequestContext) -> Result<StringResponse> {
        if let Some(status) = self.refuse(ctx) {
            return Ok(StringResponse::failed(status));
        }
        Ok(StringResponse::ok(self.config.time_tick_channel.as_str()))
    }

    async fn add_query_channel(
        &self,
        ctx: &RequestContext,
        req: AddQueryChannelRequest,
    ) -> Result<Status> {
        if let Some(status) = self.refuse(ctx).or_else(|| self.check_node(req.node_id)) {
            return Ok(status);
        }
        if req.query_channel.is_empty() {
            return Ok(Status::error(
                ErrorCode::IllegalArgument,
                "query channel must not be empty",
            ));
        }

        let mut collections = self.collections.write();
        let collection = collections.entry(req.collection_id).or_default();
        if collection.query_channels.contains_key(&req.query_channel) {
            debug!(
                "Query channel {} already added for collection {}",
                req.query_channel, req.collection_id
            );
            return Ok(Status::success());
        }
        collection
            .query_channels
            .insert(req.query_channel.clone(), req.query_result_channel);
        info!(
            "Added query channel {} for collection {}",
            req.query_channel, req.collection_id
        );
        Ok(Status::success())
    }

    async fn remove_query_channel(
        &self,
        ctx: &RequestContext,
        req: RemoveQueryChannelRequest,
    ) -> Result<Status> {
        if let Some(status) = self.refuse(ctx).or_else(|| self.check_node(req.node_id)) {
            return Ok(status);
        }

        let mut collections = self.collections.write();
        let Some(collection) = collections.get_mut(&req.collection_id) else {
            return Ok(Status::error(
                ErrorCode::CollectionNotExists,
                format!("collection {} has no query channels", req.collection_id),
            ));
        };
        if collection.query_channels.remove(&req.query_channel).is_none() {
            warn!(
                "Query channel {} was not registered for collection {}",
                req.query_channel, req.collection_id
            );
        }
        Ok(Status::success())
    }

    async fn watch_dm_channels(
        &self,
        ctx: &RequestContext,
        req: WatchDmChannelsRequest,
    ) -> Result<Status> {
        if let Some(status) = self.refuse(ctx).or_else(|| self.check_node(req.node_id)) {
            return Ok(status);
        }
        if req.infos.is_empty() {
            return Ok(Status::error(
                ErrorCode::IllegalArgument,
                "no dm channels to watch",
            ));
        }

        let mut collections = self.collections.write();
        let collection = collections.entry(req.collection_id).or_default();
        collection.partitions.extend(req.partition_ids.iter().copied());
        for info in &req.infos {
            collection.dm_channels.insert(info.channel_name.clone());
        }
        info!(
            "Watching {} dm channel(s) for collection {}",
            req.infos.len(),
            req.collection_id
        );
        Ok(Status::success())
    }

    async fn watch_delta_channels(
        &self,
        ctx: &RequestContext,
        req: WatchDeltaChannelsRequest,
    ) -> Result<Status> {
        if let Some(status) = self.refuse(ctx).or_else(|| self.check_node(req.node_id)) {
            return Ok(status);
        }
        if req.infos.is_empty() {
            return Ok(Status::error(
                ErrorCode::IllegalArgument,
                "no delta channels to watch",
            ));
        }

        let mut collections = self.collections.write();
        let collection = collections.entry(req.collection_id).or_default();
        for info in &req.infos {
            collection.delta_channels.insert(info.channel_name.clone());
        }
        info!(
            "Watching {} delta channel(s) for collection {}",
            req.infos.len(),
            req.collection_id
        );
        Ok(Status::success())
    }

    async fn load_segments(
        &self,
        ctx: &RequestContext,
        req: LoadSegmentsRequest,
    ) -> Result<Status> {
        if let Some(status) = self.refuse(ctx).or_else(|| self.check_node(req.dst_node_id)) {
            return Ok(status);
        }
        if let Some(stray) = req
            .infos
            .iter()
            .find(|info| info.collection_id != req.collection_id)
        {
            return Ok(Status::error(
                ErrorCode::IllegalArgument,
                format!(
                    "segment {} belongs to collection {}, request is for {}",
                    stray.segment_id, stray.collection_id, req.collection_id
                ),
            ));
        }
        if let Some(bad) = req
            .infos
            .iter()
            .find(|info| info.num_of_rows < 0 || info.segment_size < 0)
        {
            return Ok(Status::error(
                ErrorCode::IllegalArgument,
                format!(
                    "segment {} has negative size ({} rows, {} bytes)",
                    bad.segment_id, bad.num_of_rows, bad.segment_size
                ),
            ));
        }

        let mut collections = self.collections.write();
        let collection = collections.entry(req.collection_id).or_default();
        for info in req.infos {
            collection.partitions.insert(info.partition_id);
            collection.segments.insert(
                info.segment_id,
                SegmentInfo {
                    segment_id: info.segment_id,
                    collection_id: info.collection_id,
                    partition_id: info.partition_id,
                    node_id: self.node_id,
                    mem_size: info.segment_size,
                    num_rows: info.num_of_rows,
                    dm_channel: info.insert_channel,
                    state: SegmentState::Sealed,
                },
            );
        }
        info!(
            "Collection {} now has {} loaded segment(s)",
            req.collection_id,
            collection.segments.len()
        );
        Ok(Status::success())
    }

    async fn release_collection(
        &self,
        ctx: &RequestContext,
        req: ReleaseCollectionRequest,
    ) -> Result<Status> {
        if let Some(status) = self.refuse(ctx).or_else(|| self.check_node(req.node_id)) {
            return Ok(status);
        }

        match self.collections.write().remove(&req.collection_id) {
            Some(released) => info!(
                "Released collection {} ({} segment(s))",
                req.collection_id,
                released.segments.len()
            ),
            None => debug!("Collection {} was not loaded", req.collection_id),
        }
        Ok(Status::success())
    }

    async fn release_partitions(
        &self,
        ctx: &RequestContext,
        req: ReleasePartitionsRequest,
    ) -> Result<Status> {
        if let Some(status) = self.refuse(ctx).or_else(|| self.check_node(req.node_id)) {
            return Ok(status);
        }

        let mut collections = self.collections.write();
        let Some(collection) = collections.get_mut(&req.collection_id) else {
            return Ok(Status::error(
                ErrorCode::CollectionNotExists,
                format!("collection {} is not loaded", req.collection_id),
            ));
        };
        for partition_id in &req.partition_ids {
            collection.partitions.remove(partition_id);
        }
        collection
            .segments
            .retain(|_, segment| !req.partition_ids.contains(&segment.partition_id));
        info!(
            "Released {} partition(s) of collection {}",
            req.partition_ids.len(),
            req.collection_id
        );
        Ok(Status::success())
    }

    async fn release_segments(
        &self,
        ctx: &RequestContext,
        req: ReleaseSegmentsRequest,
    ) -> Result<Status> {
        if let Some(status) = self.refuse(ctx).or_else(|| self.check_node(req.node_id)) {
            return Ok(status);
        }

        let mut collections = self.collections.write();
        let Some(collection) = collections.get_mut(&req.collection_id) else {
            return Ok(Status::error(
                ErrorCode::CollectionNotExists,
                format!("collection {} is not loaded", req.collection_id),
            ));
        };
        let mut released = 0;
        for segment_id in &req.segment_ids {
            if collection.segments.remove(segment_id).is_some() {
                released += 1;
            }
        }
        info!(
            "Released {} of {} requested segment(s) in collection {}",
            released,
            req.segment_ids.len(),
            req.collection_id
        );
        Ok(Status::success())
    }

    async fn get_segment_info(
        &self,
        ctx: &RequestContext,
        req: GetSegmentInfoRequest,
    ) -> Result<GetSegmentInfoResponse> {
        if let Some(status) = self.refuse(ctx) {
            return Ok(GetSegmentInfoResponse::failed(status));
        }

        let collections = self.collections.read();
        let Some(collection) = collections.get(&req.collection_id) else {
            return Ok(GetSegmentInfoResponse::failed(Status::error(
                ErrorCode::CollectionNotExists,
                format!("collection {} is not loaded", req.collection_id),
            )));
        };

        let infos = if req.segment_ids.is_empty() {
            collection.segments.values().cloned().collect()
        } else {
            let mut infos = Vec::with_capacity(req.segment_ids.len());
            for segment_id in &req.segment_ids {
                match collection.segments.get(segment_id) {
                    Some(info) => infos.push(info.clone()),
                    None => {
                        return Ok(GetSegmentInfoResponse::failed(Status::error(
                            ErrorCode::SegmentNotFound,
                            format!(
                                "segment {} not found in collection {}",
                                segment_id, req.collection_id
                            ),
                        )))
                    }
                }
            }
            infos
        };

        Ok(GetSegmentInfoResponse {
            status: Status::success(),
            infos,
        })
    }

    async fn get_metrics(
        &self,
        ctx: &RequestContext,
        req: GetMetricsRequest,
    ) -> Result<GetMetricsResponse> {
        let name = metrics::component_name(QUERY_NODE_ROLE, self.node_id);
        if let Some(status) = self.refuse(ctx) {
            return Ok(GetMetricsResponse::failed(status, name));
        }

        let metric_type = match metrics::parse_metric_type(&req.request) {
            Ok(metric_type) => metric_type,
            Err(status) => return Ok(GetMetricsResponse::failed(status, name)),
        };
        if metric_type != SYSTEM_INFO_METRICS {
            return Ok(GetMetricsResponse::failed(
                Status::unexpected(format!(
                    "metric type {} is not implemented",
                    metric_type
                )),
                name,
            ));
        }

        let response = match serde_json::to_string(&self.system_info()) {
            Ok(response) => response,
            Err(e) => {
                return Ok(GetMetricsResponse::failed(
                    Status::unexpected(format!("failed to encode metrics: {}", e)),
                    name,
                ))
            }
        };
        Ok(GetMetricsResponse {
            status: Status::success(),
            response,
            component_name: name,
        })
    }
}
