//! Command executor - interprets and dispatches incoming commands

use super::handlers::{self, HandlerContext};
use crate::adapter::{AdapterError, MotorAdapter, ProcessLauncher, ScriptOutput, ScriptRunner};
use crate::config::DeviceConfig;
use crate::safety::{ActuatorLock, CancelToken};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::{error, info, warn};
use yakapi_shared::{ActuationPlan, Command, CommandError, Instruction, Interpreter};

/// Successful result of a command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// `ping` answered, nothing actuated
    Pong,
    /// Drive/stop sequence completed
    Actuated {
        plan: ActuationPlan,
        elapsed: Duration,
    },
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Pong => f.write_str("pong"),
            CommandOutcome::Actuated { plan, elapsed } => write!(
                f,
                "motor1={} motor2={} held {:.3}s, stopped after {:.3}s",
                plan.motor1,
                plan.motor2,
                plan.duration.as_secs_f64(),
                elapsed.as_secs_f64()
            ),
        }
    }
}

/// Errors returned by the executor
#[derive(Error, Debug)]
pub enum ExecError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("actuator busy: another command is driving the motors")]
    ActuatorBusy,
}

/// Operator-facing summary of an execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Command accepted and completed successfully
    Completed { message: String },
    /// Command accepted but an adapter failed; motors were stopped or never started
    Failed { message: String },
    /// Command rejected before anything was actuated
    Rejected { message: String },
    /// Motors were started and could not be confirmed stopped
    Critical { message: String },
}

impl CommandResult {
    pub fn from_execution<T: fmt::Display>(result: &Result<T, ExecError>) -> Self {
        match result {
            Ok(outcome) => CommandResult::Completed {
                message: outcome.to_string(),
            },
            Err(e) => Self::from_error(e),
        }
    }

    pub fn from_error(err: &ExecError) -> Self {
        let message = err.to_string();
        match err {
            ExecError::Command(_) | ExecError::ActuatorBusy => CommandResult::Rejected { message },
            ExecError::Adapter(e) if e.motors_may_be_running() => {
                CommandResult::Critical { message }
            }
            ExecError::Adapter(_) => CommandResult::Failed { message },
        }
    }
}

/// Executes commands against the configured adapters
pub struct CommandExecutor {
    interpreter: Interpreter,
    motor: MotorAdapter,
    script: ScriptRunner,
    actuator: ActuatorLock,
    max_hold: Option<Duration>,
    command_seq: AtomicU64,
}

impl CommandExecutor {
    /// Create a new command executor
    pub fn new(config: &DeviceConfig, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            interpreter: Interpreter::new(config.calibration.clone()),
            motor: MotorAdapter::new(&config.adapters, launcher.clone()),
            script: ScriptRunner::new(&config.adapters, launcher),
            actuator: ActuatorLock::new(),
            max_hold: config.adapters.max_hold,
            command_seq: AtomicU64::new(0),
        }
    }

    fn context<'a>(&'a self, cancel: &'a CancelToken) -> HandlerContext<'a> {
        HandlerContext {
            command_id: self.command_seq.fetch_add(1, Ordering::SeqCst) + 1,
            motor: &self.motor,
            script: &self.script,
            actuator: &self.actuator,
            max_hold: self.max_hold,
            cancel,
        }
    }

    /// Execute one command line
    pub async fn execute(
        &self,
        line: &str,
        cancel: &CancelToken,
    ) -> Result<CommandOutcome, ExecError> {
        let ctx = self.context(cancel);
        info!("Executing command: id={} line={:?}", ctx.command_id, line.trim());

        let result = self.dispatch(&ctx, line).await;
        report(ctx.command_id, &CommandResult::from_execution(&result));
        result
    }

    async fn dispatch(
        &self,
        ctx: &HandlerContext<'_>,
        line: &str,
    ) -> Result<CommandOutcome, ExecError> {
        let command = Command::parse(line)?;
        match self.interpreter.plan(&command)? {
            Instruction::Ping => Ok(handlers::handle_ping(ctx)),
            Instruction::Actuate(plan) => {
                handlers::handle_actuation(ctx, command.verb, plan).await
            }
        }
    }

    /// Stream a script body through the script adapter
    pub async fn run_script<R>(
        &self,
        input: R,
        cancel: &CancelToken,
    ) -> Result<ScriptOutput, ExecError>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let ctx = self.context(cancel);
        info!("Running script: id={}", ctx.command_id);

        let result = handlers::handle_script(&ctx, input).await;
        if let Err(e) = &result {
            report(ctx.command_id, &CommandResult::from_error(e));
        }
        result
    }
}

fn report(command_id: u64, result: &CommandResult) {
    match result {
        CommandResult::Completed { message } => {
            info!("  Command {} completed: {}", command_id, message)
        }
        CommandResult::Rejected { message } => {
            warn!("  Command {} rejected: {}", command_id, message)
        }
        CommandResult::Failed { message } => {
            error!("  Command {} failed: {}", command_id, message)
        }
        CommandResult::Critical { message } => {
            error!("  Command {} CRITICAL: {}", command_id, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::testing::{RecordingLauncher, Reply};
    use crate::config::AdapterConfig;
    use std::io::Cursor;
    use yakapi_shared::Verb;

    fn config() -> DeviceConfig {
        DeviceConfig {
            adapters: AdapterConfig {
                motor_adapter: Some("/opt/yak/motor".into()),
                script_adapter: Some("/opt/yak/ci".into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn executor(launcher: &Arc<RecordingLauncher>) -> CommandExecutor {
        CommandExecutor::new(&config(), launcher.clone())
    }

    #[tokio::test]
    async fn test_ping_never_invokes_adapter() {
        let launcher = Arc::new(RecordingLauncher::default());
        let outcome = executor(&launcher)
            .execute("ping", &CancelToken::never())
            .await
            .unwrap();
        assert_eq!(outcome, CommandOutcome::Pong);
        assert!(launcher.calls().is_empty());

        // Also fine with nothing configured
        let bare = CommandExecutor::new(&DeviceConfig::default(), launcher.clone());
        assert!(bare.execute("ping", &CancelToken::never()).await.is_ok());
        assert!(launcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_drive_command_sequence() {
        let launcher = Arc::new(RecordingLauncher::default());
        let outcome = executor(&launcher)
            .execute("rt 1", &CancelToken::never())
            .await
            .unwrap();

        let CommandOutcome::Actuated { plan, elapsed } = outcome else {
            panic!("expected actuation");
        };
        assert!(elapsed >= plan.duration);
        assert_eq!(
            launcher.call_args(),
            vec![
                vec!["motor1:-0.75".to_string(), "motor2:0.75".to_string()],
                vec!["motor1:0.00".to_string(), "motor2:0.00".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn test_bad_commands_are_rejected_without_adapter_calls() {
        let launcher = Arc::new(RecordingLauncher::default());
        let executor = executor(&launcher);

        for line in ["", "spin 1", "fwd", "fwd x", "lt 90 90"] {
            let result = executor.execute(line, &CancelToken::never()).await;
            assert!(matches!(result, Err(ExecError::Command(_))), "{line:?}");
            assert!(matches!(
                CommandResult::from_execution(&result),
                CommandResult::Rejected { .. }
            ));
        }
        assert!(launcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_actuation_is_refused() {
        let launcher = Arc::new(RecordingLauncher::default());
        let executor = executor(&launcher);
        let cancel = CancelToken::never();

        let first = executor.execute("fwd 20", &cancel);
        let second = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert!(executor.actuator.is_busy());
            executor.execute("bck 1", &cancel).await
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert!(matches!(second, Err(ExecError::ActuatorBusy)));
        // Only the first command reached the adapter
        assert_eq!(launcher.calls().len(), 2);
        assert!(!executor.actuator.is_busy());
    }

    #[tokio::test]
    async fn test_abandoned_actuation_keeps_actuator_until_stopped() {
        let launcher = Arc::new(RecordingLauncher::with_replies([
            Reply::Ok(Default::default()),
            Reply::Delay(Duration::from_millis(100)),
        ]));
        let executor = executor(&launcher);
        let cancel = CancelToken::never();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(30),
            executor.execute("fwd 10000", &cancel),
        )
        .await;
        assert!(abandoned.is_err());

        // The safety stop is still in flight
        assert!(executor.actuator.is_busy());
        let refused = executor.execute("bck 20", &cancel).await;
        assert!(matches!(refused, Err(ExecError::ActuatorBusy)));
        assert_eq!(launcher.calls().len(), 2);

        tokio::time::sleep(Duration::from_millis(150)).await;
        let plan = executor
            .interpreter
            .interpret("bck 20")
            .unwrap()
            .plan()
            .cloned()
            .unwrap();
        assert!(executor.execute("bck 20", &cancel).await.is_ok());
        assert_eq!(
            launcher.call_args(),
            vec![
                vec!["motor1:-0.75".to_string(), "motor2:-0.75".to_string()],
                ActuationPlan::stop_args(),
                plan.drive_args(),
                ActuationPlan::stop_args(),
            ]
        );
    }

    #[tokio::test]
    async fn test_hold_limit() {
        let launcher = Arc::new(RecordingLauncher::default());
        let mut cfg = config();
        cfg.adapters.max_hold = Some(Duration::from_millis(100));
        let executor = CommandExecutor::new(&cfg, launcher.clone());

        let err = executor.execute("fwd 50", &CancelToken::never()).await.unwrap_err();
        assert!(matches!(
            err,
            ExecError::Command(CommandError::InvalidArguments {
                verb: Verb::Forward,
                ..
            })
        ));
        assert!(launcher.calls().is_empty());

        assert!(executor.execute("fwd 5", &CancelToken::never()).await.is_ok());
    }

    #[tokio::test]
    async fn test_result_severity() {
        let never_started = Arc::new(RecordingLauncher::with_replies([Reply::Fail]));
        let result = executor(&never_started)
            .execute("fwd 1", &CancelToken::never())
            .await;
        assert!(matches!(
            CommandResult::from_execution(&result),
            CommandResult::Failed { .. }
        ));

        let not_stopped = Arc::new(RecordingLauncher::with_replies([
            Reply::Ok(Default::default()),
            Reply::Fail,
        ]));
        let result = executor(&not_stopped)
            .execute("fwd 1", &CancelToken::never())
            .await;
        assert!(matches!(
            CommandResult::from_execution(&result),
            CommandResult::Critical { .. }
        ));
    }

    #[tokio::test]
    async fn test_script_bypasses_interpreter() {
        let launcher = Arc::new(RecordingLauncher::with_replies([Reply::Ok(
            bytes::Bytes::from_static(b"accepted"),
        )]));
        let executor = executor(&launcher);

        let output = executor
            .run_script(Cursor::new(b"not a verb at all".to_vec()), &CancelToken::never())
            .await
            .unwrap();
        assert_eq!(output.output, "accepted");
        assert_eq!(launcher.calls()[0].program, std::path::PathBuf::from("/opt/yak/ci"));
    }

    #[tokio::test]
    async fn test_slow_script_does_not_hold_actuator() {
        let launcher = Arc::new(RecordingLauncher::with_replies([Reply::Delay(
            Duration::from_millis(100),
        )]));
        let executor = executor(&launcher);
        let cancel = CancelToken::never();

        let script = executor.run_script(Cursor::new(Vec::new()), &cancel);
        let drive = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            executor.execute("fwd 1", &cancel).await
        };
        let (script, drive) = tokio::join!(script, drive);
        assert!(script.is_ok());
        assert!(drive.is_ok());
    }
}
