//! Request and response messages exchanged with the query node.

mod common;
mod query;

pub use common::{
    ComponentInfo, ComponentStates, ErrorCode, GetComponentStatesRequest, GetMetricsRequest,
    GetMetricsResponse, GetStatisticsChannelRequest, GetTimeTickChannelRequest, StateCode, Status,
    StringResponse,
};
pub use query::{
    AddQueryChannelRequest, GetSegmentInfoRequest, GetSegmentInfoResponse, LoadSegmentsRequest,
    ReleaseCollectionRequest, ReleasePartitionsRequest, ReleaseSegmentsRequest,
    RemoveQueryChannelRequest, SegmentInfo, SegmentLoadInfo, SegmentState, UniqueId, VchannelInfo,
    WatchDeltaChannelsRequest, WatchDmChannelsRequest,
};
