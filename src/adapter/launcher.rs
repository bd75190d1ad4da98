//! Process launching shared by both adapter protocols
//!
//! An [`Invocation`] describes one adapter call. The launcher starts it,
//! feeds stdin, drains stdout, then waits for exit, all under an optional
//! deadline and the caller's cancellation.

use super::error::{AdapterError, ExecFailure};
use crate::safety::CancelToken;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

/// Where the adapter's stdin comes from
pub enum InputSource {
    Null,
    Stream(Box<dyn AsyncRead + Send + Unpin>),
}

impl std::fmt::Debug for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSource::Null => f.write_str("Null"),
            InputSource::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// What happens to the adapter's stdout. Stderr is always passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Pass through to our stdout
    Inherit,
    /// Collect into memory and return it
    Capture,
}

/// One adapter process call
#[derive(Debug)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub input: InputSource,
    pub output: OutputMode,
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            input: InputSource::Null,
            output: OutputMode::Inherit,
            timeout: None,
        }
    }

    pub fn with_input(mut self, input: InputSource) -> Self {
        self.input = input;
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn label(&self) -> String {
        self.program.display().to_string()
    }
}

/// Result of a successful (exit code 0) adapter call
#[derive(Debug, Clone, Default)]
pub struct Completion {
    /// Captured stdout; empty when stdout was inherited
    pub stdout: Bytes,
}

/// Starts adapter processes
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Run the invocation to completion. Non-zero exit is an error.
    async fn launch(
        &self,
        invocation: Invocation,
        cancel: &CancelToken,
    ) -> Result<Completion, AdapterError>;
}

/// Launches real processes through `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct SystemLauncher;

enum Interrupt {
    Deadline(Duration),
    Cancelled,
}

#[async_trait]
impl ProcessLauncher for SystemLauncher {
    async fn launch(
        &self,
        invocation: Invocation,
        cancel: &CancelToken,
    ) -> Result<Completion, AdapterError> {
        let label = invocation.label();
        let Invocation {
            program,
            args,
            input,
            output,
            timeout,
        } = invocation;

        let mut command = Command::new(&program);
        command
            .args(&args)
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        command.stdin(match input {
            InputSource::Null => Stdio::null(),
            InputSource::Stream(_) => Stdio::piped(),
        });
        command.stdout(match output {
            OutputMode::Inherit => Stdio::inherit(),
            OutputMode::Capture => Stdio::piped(),
        });

        debug!("Launching adapter: {} {:?}", label, args);
        let mut child = command
            .spawn()
            .map_err(|e| AdapterError::failed(&label, ExecFailure::Spawn(e)))?;

        let feed = match input {
            InputSource::Stream(reader) => child.stdin.take().map(|pipe| (reader, pipe)),
            InputSource::Null => None,
        };
        let stdout = child.stdout.take();

        let result = {
            let exchange = exchange(&mut child, feed, stdout);
            let bounded = async {
                match timeout {
                    Some(limit) => tokio::time::timeout(limit, exchange)
                        .await
                        .map_err(|_| Interrupt::Deadline(limit)),
                    None => Ok(exchange.await),
                }
            };

            tokio::select! {
                result = bounded => result,
                _ = cancel.cancelled() => Err(Interrupt::Cancelled),
            }
        };

        match result {
            Ok(Ok((status, stdout))) if status.success() => Ok(Completion { stdout }),
            Ok(Ok((status, _))) => Err(AdapterError::failed(label, ExecFailure::Exit(status))),
            Ok(Err(e)) => {
                let _ = child.kill().await;
                Err(AdapterError::failed(label, ExecFailure::Io(e)))
            }
            Err(interrupt) => {
                let _ = child.kill().await;
                Err(match interrupt {
                    Interrupt::Deadline(after) => AdapterError::Timeout {
                        program: label,
                        after,
                    },
                    Interrupt::Cancelled => AdapterError::Cancelled,
                })
            }
        }
    }
}

/// Feed stdin while draining stdout, then reap the child.
///
/// stdout must be read to EOF before waiting, otherwise an adapter that
/// fills the pipe buffer never exits.
async fn exchange(
    child: &mut Child,
    feed: Option<(Box<dyn AsyncRead + Send + Unpin>, ChildStdin)>,
    stdout: Option<ChildStdout>,
) -> io::Result<(ExitStatus, Bytes)> {
    let write_input = async move {
        if let Some((mut reader, mut pipe)) = feed {
            match tokio::io::copy(&mut reader, &mut pipe).await {
                // Adapter exited or closed stdin without reading everything
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e),
                Ok(_) => {}
            }
            // pipe dropped here, adapter sees EOF
        }
        Ok::<(), io::Error>(())
    };

    let read_output = async move {
        let mut captured = Vec::new();
        if let Some(mut out) = stdout {
            out.read_to_end(&mut captured).await?;
        }
        Ok::<Vec<u8>, io::Error>(captured)
    };

    let ((), captured) = tokio::try_join!(write_input, read_output)?;
    let status = child.wait().await?;

    Ok((status, Bytes::from(captured)))
}
