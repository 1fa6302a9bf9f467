use crate::proto::StateCode;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::debug;

/// Lock-free holder of a component's state code.
///
/// Only the owning component writes; any number of readers may `get`
/// concurrently and always observe a whole value.
#[derive(Debug)]
pub struct StateRegister {
    component: &'static str,
    code: AtomicU8,
}

impl StateRegister {
    pub fn new(component: &'static str) -> Self {
        Self {
            component,
            code: AtomicU8::new(StateCode::Initializing as u8),
        }
    }

    pub fn get(&self) -> StateCode {
        StateCode::from_u8(self.code.load(Ordering::Acquire))
    }

    pub fn set(&self, state: StateCode) {
        let previous = StateCode::from_u8(self.code.swap(state as u8, Ordering::AcqRel));
        if previous != state {
            debug!(
                "Component '{}' state changed: {} -> {}",
                self.component, previous, state
            );
        }
    }

    /// Move to `next` only if currently `expected`
    pub fn transition(&self, expected: StateCode, next: StateCode) -> bool {
        let moved = self
            .code
            .compare_exchange(
                expected as u8,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if moved {
            debug!(
                "Component '{}' state changed: {} -> {}",
                self.component, expected, next
            );
        }
        moved
    }

    pub fn is_healthy(&self) -> bool {
        self.get() == StateCode::Healthy
    }
}
