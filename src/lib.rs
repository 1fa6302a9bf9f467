pub mod config;
pub mod context;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod proto;
pub mod server;
pub mod session;
pub mod state;

pub use config::NodeConfig;
pub use context::RequestContext;
pub use coordinator::{DependencyHandle, HealthWaitPolicy, LocalCoordinator};
pub use engine::{Dependencies, LocalQueryEngine, QueryEngine};
pub use error::{FatalStartupError, NodeError, Result, RunError, StartupStage};
pub use proto::{ComponentStates, ErrorCode, StateCode, Status};
pub use server::{Server, ServerBuilder, ShutdownReason};
pub use session::{Session, SessionRegistry};
pub use state::StateRegister;
