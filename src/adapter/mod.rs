//! Adapter Module
//!
//! External hardware adapters are plain executables. Two protocols share
//! one process launcher:
//! - motor: fixed `motor1:<f> motor2:<f>` arguments, drive then stop
//! - script: arbitrary body on stdin, stdout captured

mod error;
mod launcher;
pub mod motor;
mod script;

pub use error::AdapterError;
pub use launcher::{ProcessLauncher, SystemLauncher};
pub use motor::{MotorAdapter, MOTOR_ADAPTER_SETTING};
pub use script::{ScriptOutput, ScriptRunner, SCRIPT_ADAPTER_SETTING};

#[cfg(test)]
pub(crate) use launcher::testing;
