mod orchestrator;
mod rpc;
mod runtime;
mod shutdown;
mod startup;
mod types;


pub use orchestrator::{Server, ServerBuilder, SERVER_ROLE};
pub use runtime::wait_for_shutdown_signal;
pub use types::ShutdownReason;
