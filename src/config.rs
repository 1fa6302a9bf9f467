use crate::coordinator::HealthWaitPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NodeConfig {
    pub node: NodeSection,
    pub primary_coordinator: CoordinatorConfig,
    pub secondary_coordinator: CoordinatorConfig,
    pub dependency_wait: DependencyWaitConfig,
    pub engine: EngineConfig,
    pub shutdown: ShutdownConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NodeSection {
    /// Server id of this query node within the cluster
    #[serde(default = "default_node_id")]
    pub node_id: i64,

    /// IP address the node advertises
    #[serde(default = "default_node_ip")]
    pub ip: String,

    /// Port the node advertises
    #[serde(default = "default_node_port")]
    pub port: u16,
}

impl NodeSection {
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CoordinatorConfig {
    /// Role name, used in logs and session registration
    pub role: String,

    /// Server id of the coordinator
    #[serde(default = "default_coordinator_server_id")]
    pub server_id: i64,

    /// Address of the coordinator
    pub address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DependencyWaitConfig {
    /// Health polls before a dependency is declared unavailable
    #[serde(default = "default_wait_attempts")]
    pub attempts: u32,

    /// Delay between health polls in milliseconds
    #[serde(default = "default_wait_interval_ms")]
    pub interval_ms: u64,
}

impl DependencyWaitConfig {
    pub fn policy(&self) -> HealthWaitPolicy {
        HealthWaitPolicy {
            attempts: self.attempts,
            interval: Duration::from_millis(self.interval_ms),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EngineConfig {
    /// Channel the node publishes statistics on
    #[serde(default = "default_stats_channel")]
    pub stats_channel: String,

    /// Channel the node publishes time ticks on
    #[serde(default = "default_time_tick_channel")]
    pub time_tick_channel: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ShutdownConfig {
    /// Upper bound on how long the engine may take to stop
    #[serde(default = "default_stop_timeout_seconds")]
    pub stop_timeout_seconds: u64,
}

impl NodeConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("node.node_id", defaults.node.node_id)?
            .set_default("node.ip", defaults.node.ip)?
            .set_default("node.port", defaults.node.port as i64)?
            .set_default("primary_coordinator.role", defaults.primary_coordinator.role)?
            .set_default(
                "primary_coordinator.server_id",
                defaults.primary_coordinator.server_id,
            )?
            .set_default(
                "primary_coordinator.address",
                defaults.primary_coordinator.address,
            )?
            .set_default(
                "secondary_coordinator.role",
                defaults.secondary_coordinator.role,
            )?
            .set_default(
                "secondary_coordinator.server_id",
                defaults.secondary_coordinator.server_id,
            )?
            .set_default(
                "secondary_coordinator.address",
                defaults.secondary_coordinator.address,
            )?
            .set_default("dependency_wait.attempts", defaults.dependency_wait.attempts)?
            .set_default(
                "dependency_wait.interval_ms",
                defaults.dependency_wait.interval_ms,
            )?
            .set_default("engine.stats_channel", defaults.engine.stats_channel)?
            .set_default("engine.time_tick_channel", defaults.engine.time_tick_channel)?
            .set_default(
                "shutdown.stop_timeout_seconds",
                defaults.shutdown.stop_timeout_seconds,
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with QUERYNODE_ prefix
            .add_source(Environment::with_prefix("QUERYNODE").separator("__"))
            .build()?;

        let config: NodeConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.node_id <= 0 {
            return Err(ConfigError::Message(
                "Node id must be greater than 0".to_string(),
            ));
        }

        if self.node.port == 0 {
            return Err(ConfigError::Message(
                "Node port must be greater than 0".to_string(),
            ));
        }

        for (section, coordinator) in [
            ("primary_coordinator", &self.primary_coordinator),
            ("secondary_coordinator", &self.secondary_coordinator),
        ] {
            if coordinator.role.trim().is_empty() {
                return Err(ConfigError::Message(format!(
                    "{}.role must not be empty",
                    section
                )));
            }
            if coordinator.address.trim().is_empty() {
                return Err(ConfigError::Message(format!(
                    "{}.address must not be empty",
                    section
                )));
            }
        }

        if self.primary_coordinator.role == self.secondary_coordinator.role {
            return Err(ConfigError::Message(
                "Primary and secondary coordinators must have different roles".to_string(),
            ));
        }

        if self.dependency_wait.attempts == 0 {
            return Err(ConfigError::Message(
                "Dependency wait attempts must be greater than 0".to_string(),
            ));
        }

        if self.engine.stats_channel.is_empty() || self.engine.time_tick_channel.is_empty() {
            return Err(ConfigError::Message(
                "Engine channel names must not be empty".to_string(),
            ));
        }

        if self.shutdown.stop_timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Stop timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node: NodeSection {
                node_id: default_node_id(),
                ip: default_node_ip(),
                port: default_node_port(),
            },
            primary_coordinator: CoordinatorConfig {
                role: "rootcoord".to_string(),
                server_id: default_coordinator_server_id(),
                address: "127.0.0.1:53100".to_string(),
            },
            secondary_coordinator: CoordinatorConfig {
                role: "indexcoord".to_string(),
                server_id: default_coordinator_server_id(),
                address: "127.0.0.1:31000".to_string(),
            },
            dependency_wait: DependencyWaitConfig {
                attempts: default_wait_attempts(),
                interval_ms: default_wait_interval_ms(),
            },
            engine: EngineConfig::default(),
            shutdown: ShutdownConfig {
                stop_timeout_seconds: default_stop_timeout_seconds(),
            },
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stats_channel: default_stats_channel(),
            time_tick_channel: default_time_tick_channel(),
        }
    }
}

// Default value functions
fn default_node_id() -> i64 {
    1
}
fn default_node_ip() -> String {
    "127.0.0.1".to_string()
}
fn default_node_port() -> u16 {
    21123
}
fn default_coordinator_server_id() -> i64 {
    1
}

fn default_wait_attempts() -> u32 {
    300
}
fn default_wait_interval_ms() -> u64 {
    200
}

fn default_stats_channel() -> String {
    "by-dev-query-node-stats".to_string()
}
fn default_time_tick_channel() -> String {
    "by-dev-queryTimeTick".to_string()
}

fn default_stop_timeout_seconds() -> u64 {
    10
}
