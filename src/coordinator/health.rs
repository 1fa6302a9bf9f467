use super::DependencyHandle;
use crate::context::RequestContext;
use crate::error::{NodeError, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// How long to poll a dependency before giving up on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthWaitPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for HealthWaitPolicy {
    fn default() -> Self {
        Self {
            attempts: 300,
            interval: Duration::from_millis(200),
        }
    }
}

/// Poll `handle` until it reports a healthy state with a successful status.
///
/// An error reply from the dependency ends the wait immediately; an
/// unhealthy reply is retried until `policy.attempts` is used up.
pub async fn wait_for_component_healthy(
    handle: &dyn DependencyHandle,
    ctx: &RequestContext,
    policy: HealthWaitPolicy,
) -> Result<()> {
    info!("Waiting for {} to become healthy", handle.name());

    let attempts = policy.attempts.max(1);
    let mut last_seen = None;

    for attempt in 1..=attempts {
        if ctx.is_done() {
            return Err(NodeError::component(
                handle.name(),
                "health wait cancelled",
            ));
        }

        let states = handle.get_component_states(ctx).await?;
        if states.is_healthy() {
            info!("{} is healthy after {} attempt(s)", handle.name(), attempt);
            return Ok(());
        }

        debug!(
            "{} not healthy yet (attempt {}/{}): state={}, status={:?}",
            handle.name(),
            attempt,
            attempts,
            states.state.state_code,
            states.status.error_code
        );
        last_seen = Some(states);

        if attempt < attempts {
            tokio::select! {
                _ = sleep(policy.interval) => {}
                _ = ctx.cancellation().cancelled() => {}
            }
        }
    }

    let detail = match last_seen {
        Some(states) => format!(
            "not healthy after {} attempts (state {}, status {:?}: {})",
            attempts, states.state.state_code, states.status.error_code, states.status.reason
        ),
        None => format!("not healthy after {} attempts", attempts),
    };
    Err(NodeError::component(handle.name(), detail))
}
