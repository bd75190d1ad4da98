//! Run-and-capture protocol for the script adapter
//!
//! The request body is streamed to the adapter's stdin, stdout is captured
//! and returned, stderr is passed through for the operator.

use super::error::AdapterError;
use super::launcher::{InputSource, Invocation, OutputMode, ProcessLauncher};
use crate::config::AdapterConfig;
use crate::safety::CancelToken;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;

/// Setting that names the script adapter executable
pub const SCRIPT_ADAPTER_SETTING: &str = "YAKAPI_CI_ADAPTER";

/// Captured result of a script run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Adapter stdout as text (invalid UTF-8 replaced)
    pub output: String,
    /// Raw number of bytes the adapter wrote
    pub bytes: usize,
}

pub struct ScriptRunner {
    launcher: Arc<dyn ProcessLauncher>,
    program: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ScriptRunner {
    pub fn new(config: &AdapterConfig, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            launcher,
            program: config.script_adapter.clone(),
            timeout: config.script_timeout,
        }
    }

    /// Stream `input` through the adapter.
    ///
    /// The adapter identity comes from [`AdapterConfig::script_adapter`]
    /// when the runner is built, so callers only pass the input.
    pub async fn run<R>(
        &self,
        input: R,
        cancel: &CancelToken,
    ) -> Result<ScriptOutput, AdapterError>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let program = self.program.as_ref().ok_or(AdapterError::NotConfigured {
            setting: SCRIPT_ADAPTER_SETTING,
        })?;

        let invocation = Invocation::new(program, Vec::new())
            .with_input(InputSource::Stream(Box::new(input)))
            .with_output(OutputMode::Capture)
            .with_timeout(self.timeout);

        let completion = self.launcher.launch(invocation, cancel).await?;

        Ok(ScriptOutput {
            output: String::from_utf8_lossy(&completion.stdout).into_owned(),
            bytes: completion.stdout.len(),
        })
    }
}
