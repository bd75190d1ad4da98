//! Liveness check handler

use super::HandlerContext;
use crate::command::CommandOutcome;
use tracing::debug;

/// Handle `ping`. Never touches an adapter.
pub fn handle_ping(ctx: &HandlerContext<'_>) -> CommandOutcome {
    debug!("  [PING] command {}", ctx.command_id);
    CommandOutcome::Pong
}
