//! YakAPI Shared Command Types
//!
//! This crate provides the command vocabulary and the pure command
//! interpreter used by the device runtime. Nothing in here performs I/O.

pub mod command;
pub mod interpreter;
pub mod plan;

pub use command::{Command, CommandError, Verb};
pub use interpreter::{Calibration, Instruction, Interpreter};
pub use plan::{ActuationPlan, MotorChannel, Throttle};

/// Reference calibration for the stock drive train
pub mod calibration {
    /// Throttle magnitude for `fwd`/`bck`
    pub const CRUISE_THROTTLE: f64 = 0.75;

    /// Throttle magnitude for `ffwd`
    pub const FULL_THROTTLE: f64 = 1.0;

    /// Throttle magnitude for `lt`/`rt`
    pub const SPIN_THROTTLE: f64 = 0.75;

    /// Time to turn through `SPIN_ANGLE_DEG`
    pub const SPIN_DURATION_MS: u64 = 2000;

    pub const SPIN_ANGLE_DEG: f64 = 90.0;

    /// `fwd`/`ffwd`/`bck` arguments count in units of this many milliseconds
    pub const DURATION_UNIT_MS: u64 = 10;
}
