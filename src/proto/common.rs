use serde::{Deserialize, Serialize};

/// Result codes carried in every response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    Success,
    UnexpectedError,
    IllegalArgument,
    NotReadyServe,
    SegmentNotFound,
    CollectionNotExists,
}

/// Result envelope embedded in every RPC response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub error_code: ErrorCode,
    #[serde(default)]
    pub reason: String,
}

impl Status {
    pub fn success() -> Self {
        Self {
            error_code: ErrorCode::Success,
            reason: String::new(),
        }
    }

    pub fn error<S: Into<String>>(error_code: ErrorCode, reason: S) -> Self {
        Self {
            error_code,
            reason: reason.into(),
        }
    }

    pub fn unexpected<S: Into<String>>(reason: S) -> Self {
        Self::error(ErrorCode::UnexpectedError, reason)
    }

    pub fn is_success(&self) -> bool {
        self.error_code == ErrorCode::Success
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::success()
    }
}

/// Coarse health classification used for liveness reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StateCode {
    Initializing = 0,
    Healthy = 1,
    Abnormal = 2,
}

impl StateCode {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => StateCode::Initializing,
            1 => StateCode::Healthy,
            _ => StateCode::Abnormal,
        }
    }
}

impl std::fmt::Display for StateCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StateCode::Initializing => "Initializing",
            StateCode::Healthy => "Healthy",
            StateCode::Abnormal => "Abnormal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub node_id: i64,
    pub role: String,
    pub state_code: StateCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentStates {
    pub state: ComponentInfo,
    #[serde(default)]
    pub subcomponent_states: Vec<ComponentInfo>,
    pub status: Status,
}

impl ComponentStates {
    pub fn new<R: Into<String>>(node_id: i64, role: R, state_code: StateCode) -> Self {
        Self {
            state: ComponentInfo {
                node_id,
                role: role.into(),
                state_code,
            },
            subcomponent_states: Vec::new(),
            status: Status::success(),
        }
    }

    /// Healthy state with a successful status
    pub fn is_healthy(&self) -> bool {
        self.status.is_success() && self.state.state_code == StateCode::Healthy
    }
}

/// Response carrying a single channel name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringResponse {
    pub status: Status,
    #[serde(default)]
    pub value: String,
}

impl StringResponse {
    pub fn ok<S: Into<String>>(value: S) -> Self {
        Self {
            status: Status::success(),
            value: value.into(),
        }
    }

    pub fn failed(status: Status) -> Self {
        Self {
            status,
            value: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetComponentStatesRequest {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetStatisticsChannelRequest {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTimeTickChannelRequest {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetMetricsRequest {
    /// JSON document, e.g. `{"metric_type": "system_info"}`
    pub request: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetMetricsResponse {
    pub status: Status,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub component_name: String,
}

impl GetMetricsResponse {
    pub fn failed(status: Status, component_name: String) -> Self {
        Self {
            status,
            response: String::new(),
            component_name,
        }
    }
}
