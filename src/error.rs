use thiserror::Error;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },

    #[error("{component} is not ready: {message}")]
    NotReady { component: String, message: String },

    #[error("Session error: {message}")]
    Session { message: String },
}

impl NodeError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<C: Into<String>, S: Into<String>>(component: C, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn not_ready<C: Into<String>, S: Into<String>>(component: C, message: S) -> Self {
        Self::NotReady {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn session<S: Into<String>>(message: S) -> Self {
        Self::Session {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NodeError>;

/// Lifecycle step that was executing when startup failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupStage {
    Init,
    Start,
    WaitHealthy,
    Register,
    Wire,
}

impl std::fmt::Display for StartupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            StartupStage::Init => "init",
            StartupStage::Start => "start",
            StartupStage::WaitHealthy => "wait-healthy",
            StartupStage::Register => "register",
            StartupStage::Wire => "wire",
        };
        f.write_str(stage)
    }
}

/// A dependency could not be brought up. The node must not keep running.
#[derive(Error, Debug)]
#[error("dependency {dependency} failed during {stage}: {source}")]
pub struct FatalStartupError {
    pub dependency: String,
    pub stage: StartupStage,
    #[source]
    pub source: NodeError,
}

impl FatalStartupError {
    pub fn new<S: Into<String>>(dependency: S, stage: StartupStage, source: NodeError) -> Self {
        Self {
            dependency: dependency.into(),
            stage,
            source,
        }
    }
}

/// Outcome of a failed `Server::run`
#[derive(Error, Debug)]
pub enum RunError {
    /// Process entry point must exit; see [`RunError::exit_code`]
    #[error(transparent)]
    Fatal(#[from] FatalStartupError),

    /// The engine failed to come up; the caller decides whether to retry
    #[error("engine failed during {stage}: {source}")]
    Engine {
        stage: StartupStage,
        #[source]
        source: NodeError,
    },
}

pub const EXIT_FATAL_STARTUP: i32 = 1;
pub const EXIT_ENGINE_STARTUP: i32 = 2;
pub const EXIT_SHUTDOWN_FAILURE: i32 = 3;

impl RunError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, RunError::Fatal(_))
    }

    /// Process exit code for this failure class
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Fatal(_) => EXIT_FATAL_STARTUP,
            RunError::Engine { .. } => EXIT_ENGINE_STARTUP,
        }
    }
}
