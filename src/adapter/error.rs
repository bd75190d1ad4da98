//! Adapter failure taxonomy

use std::io;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Why an adapter process did not complete successfully
#[derive(Error, Debug)]
pub enum ExecFailure {
    #[error("could not start: {0}")]
    Spawn(#[source] io::Error),

    #[error("i/o error: {0}")]
    Io(#[source] io::Error),

    #[error("exited with {0}")]
    Exit(ExitStatus),
}

/// Errors surfaced by the adapter layer. None of these are retried here.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("{setting} not configured")]
    NotConfigured { setting: &'static str },

    #[error("adapter {program} timed out after {after:?}")]
    Timeout { program: String, after: Duration },

    #[error("adapter {program} failed: {cause}")]
    ExecutionFailed {
        program: String,
        #[source]
        cause: ExecFailure,
    },

    /// The drive call succeeded but the stop call did not
    #[error("adapter {program} failed to stop the motors, they may still be running: {source}")]
    PartialActuation {
        program: String,
        #[source]
        source: Box<AdapterError>,
    },

    #[error("adapter call cancelled")]
    Cancelled,
}

impl AdapterError {
    pub fn failed(program: impl Into<String>, cause: ExecFailure) -> Self {
        Self::ExecutionFailed {
            program: program.into(),
            cause,
        }
    }

    /// True when the actuator may have been left running
    pub fn motors_may_be_running(&self) -> bool {
        matches!(self, AdapterError::PartialActuation { .. })
    }
}
