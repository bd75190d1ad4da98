//! Drive/stop handler for `fwd`, `ffwd`, `bck`, `lt`, `rt`

use super::HandlerContext;
use crate::command::{CommandOutcome, ExecError};
use tokio::time::Instant;
use tracing::{error, info};
use yakapi_shared::{ActuationPlan, CommandError, Verb};

/// Run one actuation plan while holding the actuator
pub async fn handle_actuation(
    ctx: &HandlerContext<'_>,
    verb: Verb,
    plan: ActuationPlan,
) -> Result<CommandOutcome, ExecError> {
    if let Some(max_hold) = ctx.max_hold {
        if plan.duration > max_hold {
            return Err(CommandError::InvalidArguments {
                verb,
                reason: format!(
                    "hold of {:.3}s exceeds the {:.3}s limit",
                    plan.duration.as_secs_f64(),
                    max_hold.as_secs_f64()
                ),
            }
            .into());
        }
    }

    let actuator = ctx.actuator.try_acquire().ok_or(ExecError::ActuatorBusy)?;

    info!(
        "  [{}] motor1={} motor2={} for {:.3}s",
        verb,
        plan.motor1,
        plan.motor2,
        plan.duration.as_secs_f64()
    );

    let started = Instant::now();
    if let Err(e) = ctx.motor.invoke(&plan, actuator, ctx.cancel).await {
        if e.motors_may_be_running() {
            error!("  [{}] !!! STOP FAILED, MOTORS MAY STILL BE RUNNING !!!", verb);
        }
        return Err(e.into());
    }

    Ok(CommandOutcome::Actuated {
        plan,
        elapsed: started.elapsed(),
    })
}
