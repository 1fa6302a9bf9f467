use super::common::Status;
use serde::{Deserialize, Serialize};

pub type UniqueId = i64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddQueryChannelRequest {
    pub node_id: UniqueId,
    pub collection_id: UniqueId,
    pub query_channel: String,
    pub query_result_channel: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveQueryChannelRequest {
    pub node_id: UniqueId,
    pub collection_id: UniqueId,
    pub query_channel: String,
    pub query_result_channel: String,
}

/// Virtual channel assignment for one collection shard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VchannelInfo {
    pub collection_id: UniqueId,
    pub channel_name: String,
    #[serde(default)]
    pub seek_position: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchDmChannelsRequest {
    pub node_id: UniqueId,
    pub collection_id: UniqueId,
    #[serde(default)]
    pub partition_ids: Vec<UniqueId>,
    pub infos: Vec<VchannelInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchDeltaChannelsRequest {
    pub node_id: UniqueId,
    pub collection_id: UniqueId,
    pub infos: Vec<VchannelInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentLoadInfo {
    pub segment_id: UniqueId,
    pub partition_id: UniqueId,
    pub collection_id: UniqueId,
    #[serde(default)]
    pub insert_channel: String,
    #[serde(default)]
    pub num_of_rows: i64,
    #[serde(default)]
    pub segment_size: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSegmentsRequest {
    pub dst_node_id: UniqueId,
    pub collection_id: UniqueId,
    pub infos: Vec<SegmentLoadInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseCollectionRequest {
    pub node_id: UniqueId,
    pub collection_id: UniqueId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleasePartitionsRequest {
    pub node_id: UniqueId,
    pub collection_id: UniqueId,
    pub partition_ids: Vec<UniqueId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSegmentsRequest {
    pub node_id: UniqueId,
    pub collection_id: UniqueId,
    #[serde(default)]
    pub partition_ids: Vec<UniqueId>,
    pub segment_ids: Vec<UniqueId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetSegmentInfoRequest {
    pub collection_id: UniqueId,
    /// Empty means every segment of the collection
    #[serde(default)]
    pub segment_ids: Vec<UniqueId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentState {
    Growing,
    Sealed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentInfo {
    pub segment_id: UniqueId,
    pub collection_id: UniqueId,
    pub partition_id: UniqueId,
    pub node_id: UniqueId,
    pub mem_size: i64,
    pub num_rows: i64,
    pub dm_channel: String,
    pub state: SegmentState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetSegmentInfoResponse {
    pub status: Status,
    #[serde(default)]
    pub infos: Vec<SegmentInfo>,
}

impl GetSegmentInfoResponse {
    pub fn failed(status: Status) -> Self {
        Self {
            status,
            infos: Vec::new(),
        }
    }
}
