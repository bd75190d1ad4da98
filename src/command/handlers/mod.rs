//! Command handlers

mod actuate;
mod ping;
mod script;

pub use actuate::handle_actuation;
pub use ping::handle_ping;
pub use script::handle_script;

use crate::adapter::{MotorAdapter, ScriptRunner};
use crate::safety::{ActuatorLock, CancelToken};
use std::time::Duration;

/// Context passed to command handlers
pub struct HandlerContext<'a> {
    pub command_id: u64,
    pub motor: &'a MotorAdapter,
    pub script: &'a ScriptRunner,
    pub actuator: &'a ActuatorLock,
    pub max_hold: Option<Duration>,
    pub cancel: &'a CancelToken,
}
