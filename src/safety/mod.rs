//! Safety Module
//!
//! Keeps the motors from being left running: caller cancellation that
//! still lets the stop call through, a drop guard for abandoned
//! actuations, and a lock so only one actuation drives at a time.

mod actuator;
mod cancel;
mod stop_guard;

pub use actuator::{ActuatorGuard, ActuatorLock};
pub use cancel::{cancel_pair, CancelToken};
pub use stop_guard::StopGuard;
