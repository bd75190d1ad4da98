//! Drive/stop protocol for the motor adapter
//!
//! The adapter is invoked as `<adapter> motor1:<f> motor2:<f>`. A drive
//! command is always two calls: start the motors, hold for the plan's
//! duration, then set both channels to zero.

use super::error::AdapterError;
use super::launcher::{Invocation, ProcessLauncher};
use crate::config::AdapterConfig;
use crate::safety::{ActuatorGuard, CancelToken, StopGuard};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use yakapi_shared::ActuationPlan;

/// Setting that names the motor adapter executable
pub const MOTOR_ADAPTER_SETTING: &str = "YAKAPI_ADAPTER_MOTOR";

/// Build one motor adapter call. Output goes straight to our stdout.
pub(crate) fn motor_invocation(
    program: &Path,
    args: Vec<String>,
    call_timeout: Duration,
) -> Invocation {
    Invocation::new(program, args).with_timeout(Some(call_timeout))
}

pub(crate) fn stop_invocation(program: &Path, call_timeout: Duration) -> Invocation {
    motor_invocation(program, ActuationPlan::stop_args(), call_timeout)
}

/// Drives the motors through the external adapter
pub struct MotorAdapter {
    launcher: Arc<dyn ProcessLauncher>,
    program: Option<PathBuf>,
    call_timeout: Duration,
}

impl MotorAdapter {
    pub fn new(config: &AdapterConfig, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            launcher,
            program: config.motor_adapter.clone(),
            call_timeout: config.call_timeout,
        }
    }

    fn program(&self) -> Result<&Path, AdapterError> {
        self.program
            .as_deref()
            .ok_or(AdapterError::NotConfigured {
                setting: MOTOR_ADAPTER_SETTING,
            })
    }

    /// Single adapter call, bounded by the per-call timeout
    pub async fn invoke_raw(
        &self,
        args: Vec<String>,
        cancel: &CancelToken,
    ) -> Result<(), AdapterError> {
        let program = self.program()?;
        self.launcher
            .launch(motor_invocation(program, args, self.call_timeout), cancel)
            .await
            .map(|_| ())
    }

    /// Drive, hold, stop.
    ///
    /// A failed drive call returns its error and no stop is sent. Once the
    /// drive call succeeds the stop call is always made, also when the hold
    /// is cancelled. A failed stop is reported as
    /// [`AdapterError::PartialActuation`].
    ///
    /// `actuator` is released once the stop call has finished, including
    /// the stop sent on behalf of an abandoned actuation.
    pub async fn invoke(
        &self,
        plan: &ActuationPlan,
        actuator: ActuatorGuard,
        cancel: &CancelToken,
    ) -> Result<(), AdapterError> {
        let program = self.program()?.to_path_buf();

        self.invoke_raw(plan.drive_args(), cancel).await?;
        let guard = StopGuard::arm(
            self.launcher.clone(),
            program.clone(),
            self.call_timeout,
            actuator,
        );

        // The hold is not bounded by the per-call timeout
        info!("Holding actuation for {:.3}s", plan.duration.as_secs_f64());
        let interrupted = tokio::select! {
            _ = tokio::time::sleep(plan.duration) => false,
            _ = cancel.cancelled() => true,
        };

        // The caller's cancellation must not abort the stop
        let stopped = self
            .launcher
            .launch(stop_invocation(&program, self.call_timeout), &CancelToken::never())
            .await;
        guard.disarm();

        match stopped {
            Err(e) => Err(AdapterError::PartialActuation {
                program: program.display().to_string(),
                source: Box::new(e),
            }),
            Ok(_) if interrupted => Err(AdapterError::Cancelled),
            Ok(_) => Ok(()),
        }
    }
}
