mod handle;
mod health;
mod local;

pub use handle::DependencyHandle;
pub use health::{wait_for_component_healthy, HealthWaitPolicy};
pub use local::LocalCoordinator;
