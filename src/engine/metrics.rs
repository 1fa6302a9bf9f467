use crate::proto::{ErrorCode, StateCode, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SYSTEM_INFO_METRICS: &str = "system_info";

#[derive(Debug, Deserialize)]
struct MetricsRequest {
    metric_type: String,
}

/// Extract the metric type from a JSON metrics request
pub fn parse_metric_type(request: &str) -> Result<String, Status> {
    serde_json::from_str::<MetricsRequest>(request)
        .map(|req| req.metric_type)
        .map_err(|e| {
            Status::error(
                ErrorCode::IllegalArgument,
                format!("invalid metrics request: {}", e),
            )
        })
}

pub fn component_name(role: &str, node_id: i64) -> String {
    format!("{}{}", role, node_id)
}

/// Snapshot reported for `system_info` metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfoMetrics {
    pub name: String,
    pub node_id: i64,
    pub address: String,
    pub state: StateCode,
    pub started_at: Option<DateTime<Utc>>,
    pub dependencies: Vec<String>,
    pub collections: usize,
    pub partitions: usize,
    pub segments: usize,
    pub total_rows: i64,
    pub total_mem_size: i64,
    pub dm_channels: usize,
    pub delta_channels: usize,
    pub query_channels: usize,
}
