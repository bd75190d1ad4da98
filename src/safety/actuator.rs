//! Single-actuator lock
//!
//! Only one drive/stop sequence may own the motors at a time. The guard is
//! owned, so it can travel with an abandoned actuation into the task that
//! sends its stop call.

use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default, Clone)]
pub struct ActuatorLock {
    inner: Arc<Mutex<()>>,
}

/// Held until the stop call of the sequence has completed
#[derive(Debug)]
pub struct ActuatorGuard {
    _guard: OwnedMutexGuard<()>,
}

impl ActuatorLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the actuator, or `None` if another sequence owns it
    pub fn try_acquire(&self) -> Option<ActuatorGuard> {
        self.inner
            .clone()
            .try_lock_owned()
            .ok()
            .map(|guard| ActuatorGuard { _guard: guard })
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}
