//! Script run handler

use super::HandlerContext;
use crate::adapter::ScriptOutput;
use crate::command::ExecError;
use tokio::io::AsyncRead;
use tracing::info;

/// Stream a script body through the script adapter.
///
/// Does not take the actuator lock; the script adapter owns its own
/// hardware access.
pub async fn handle_script<R>(ctx: &HandlerContext<'_>, input: R) -> Result<ScriptOutput, ExecError>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let output = ctx.script.run(input, ctx.cancel).await?;
    info!("  [SCRIPT] adapter wrote {} bytes", output.bytes);
    Ok(output)
}
