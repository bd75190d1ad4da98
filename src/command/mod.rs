//! Command execution for the device
//!
//! This module handles:
//! - Interpreting command lines into actuation plans
//! - Dispatching to the appropriate handler
//! - Serialising access to the motors
//! - Reporting results to the caller

mod executor;
pub mod handlers;

pub use executor::{CommandExecutor, CommandOutcome, CommandResult, ExecError};
