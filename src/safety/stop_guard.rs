//! Guaranteed motor stop
//!
//! Armed once a drive call has succeeded. If the actuation is abandoned
//! before the stop call completes (its future dropped), the guard issues
//! the stop itself on the current runtime. The actuator stays claimed until
//! that stop has finished.

use super::{ActuatorGuard, CancelToken};
use crate::adapter::{motor, ProcessLauncher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

pub struct StopGuard {
    launcher: Arc<dyn ProcessLauncher>,
    program: PathBuf,
    call_timeout: Duration,
    actuator: Option<ActuatorGuard>,
}

impl StopGuard {
    pub fn arm(
        launcher: Arc<dyn ProcessLauncher>,
        program: PathBuf,
        call_timeout: Duration,
        actuator: ActuatorGuard,
    ) -> Self {
        Self {
            launcher,
            program,
            call_timeout,
            actuator: Some(actuator),
        }
    }

    /// The stop has been issued by the owner; releases the actuator
    pub fn disarm(mut self) {
        self.actuator.take();
    }
}

impl Drop for StopGuard {
    fn drop(&mut self) {
        let Some(actuator) = self.actuator.take() else {
            return;
        };

        let launcher = self.launcher.clone();
        let invocation = motor::stop_invocation(&self.program, self.call_timeout);
        let label = invocation.label();

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    let cancel = CancelToken::never();
                    match launcher.launch(invocation, &cancel).await {
                        Ok(_) => {
                            warn!("[SAFETY] Actuation abandoned, motors stopped via {}", label)
                        }
                        Err(e) => error!(
                            "[SAFETY] Actuation abandoned and stop failed, \
                             motors may still be running: {}",
                            e
                        ),
                    }
                    drop(actuator);
                });
            }
            Err(_) => {
                error!(
                    "[SAFETY] Actuation abandoned outside a runtime, cannot stop {}",
                    label
                );
            }
        }
    }
}
