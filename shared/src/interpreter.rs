//! Command interpreter
//!
//! Turns a command line into an [`Instruction`]. Pure: no I/O, no clock,
//! never blocks.

use crate::calibration;
use crate::command::{Command, CommandError, Verb};
use crate::plan::{ActuationPlan, Throttle};
use std::time::Duration;

/// Hardware calibration used to turn verbs into throttles and durations
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    /// Magnitude for `fwd` and `bck`
    pub cruise_throttle: f64,
    /// Magnitude for `ffwd`
    pub full_throttle: f64,
    /// Magnitude for `lt` and `rt`
    pub spin_throttle: f64,
    /// Time to turn through `spin_angle_deg` degrees
    pub spin_duration: Duration,
    pub spin_angle_deg: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            cruise_throttle: calibration::CRUISE_THROTTLE,
            full_throttle: calibration::FULL_THROTTLE,
            spin_throttle: calibration::SPIN_THROTTLE,
            spin_duration: Duration::from_millis(calibration::SPIN_DURATION_MS),
            spin_angle_deg: calibration::SPIN_ANGLE_DEG,
        }
    }
}

/// What the caller has to do for a command
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Liveness check; nothing to actuate
    Ping,
    /// Drive, hold, stop
    Actuate(ActuationPlan),
}

impl Instruction {
    pub fn plan(&self) -> Option<&ActuationPlan> {
        match self {
            Instruction::Ping => None,
            Instruction::Actuate(plan) => Some(plan),
        }
    }
}

/// Interprets command lines against a calibration
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    calibration: Calibration,
}

impl Interpreter {
    pub fn new(calibration: Calibration) -> Self {
        Self { calibration }
    }

    /// Interpret a raw command line
    pub fn interpret(&self, line: &str) -> Result<Instruction, CommandError> {
        let command = Command::parse(line)?;
        self.plan(&command)
    }

    /// Compute the instruction for an already tokenized command
    pub fn plan(&self, command: &Command) -> Result<Instruction, CommandError> {
        let cal = &self.calibration;
        let cruise = Throttle::new(cal.cruise_throttle);
        let full = Throttle::new(cal.full_throttle);
        let spin = Throttle::new(cal.spin_throttle);

        // Forward is negative on this drive train
        let plan = match command.verb {
            Verb::Ping => return Ok(Instruction::Ping),
            Verb::Forward => ActuationPlan::new(-cruise, -cruise, linear_duration(command)?),
            Verb::FastForward => ActuationPlan::new(-full, -full, linear_duration(command)?),
            Verb::Back => ActuationPlan::new(cruise, cruise, linear_duration(command)?),
            Verb::Right => ActuationPlan::new(-spin, spin, self.spin_duration(command)?),
            Verb::Left => ActuationPlan::new(spin, -spin, self.spin_duration(command)?),
        };

        Ok(Instruction::Actuate(plan))
    }

    /// `spin_duration * (angle / spin_angle_deg)`
    fn spin_duration(&self, command: &Command) -> Result<Duration, CommandError> {
        let angle = required_arg(command)?;
        let cal = &self.calibration;
        let secs = cal.spin_duration.as_secs_f64() * (angle as f64 / cal.spin_angle_deg);
        Duration::try_from_secs_f64(secs).map_err(|e| {
            CommandError::arguments(command.verb, format!("angle {angle} out of range: {e}"))
        })
    }
}

fn required_arg(command: &Command) -> Result<u64, CommandError> {
    command
        .arg
        .ok_or_else(|| CommandError::arguments(command.verb, "missing argument"))
}

/// Argument is in tens of milliseconds
fn linear_duration(command: &Command) -> Result<Duration, CommandError> {
    let units = required_arg(command)?;
    units
        .checked_mul(calibration::DURATION_UNIT_MS)
        .map(Duration::from_millis)
        .ok_or_else(|| {
            CommandError::arguments(command.verb, format!("duration {units} out of range"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actuate(line: &str) -> ActuationPlan {
        match Interpreter::default().interpret(line) {
            Ok(Instruction::Actuate(plan)) => plan,
            other => panic!("expected actuation for {line:?}, got {other:?}"),
        }
    }

    fn throttles(plan: &ActuationPlan) -> (f64, f64) {
        (plan.motor1.value(), plan.motor2.value())
    }

    #[test]
    fn test_ping_has_no_plan() {
        let instruction = Interpreter::default().interpret("ping").unwrap();
        assert_eq!(instruction, Instruction::Ping);
        assert!(instruction.plan().is_none());

        let with_extra = Interpreter::default().interpret("ping 1").unwrap();
        assert_eq!(with_extra, Instruction::Ping);
    }

    #[test]
    fn test_forward_scenario() {
        let plan = actuate("fwd 50");
        assert_eq!(plan.duration, Duration::from_millis(500));
        assert_eq!(throttles(&plan), (-0.75, -0.75));
    }

    #[test]
    fn test_linear_duration_is_exact() {
        for n in [0u64, 1, 7, 50, 123, 10_000] {
            for verb in ["fwd", "ffwd", "bck"] {
                let plan = actuate(&format!("{verb} {n}"));
                assert_eq!(plan.duration, Duration::from_millis(n * 10), "{verb} {n}");
            }
        }
    }

    #[test]
    fn test_fast_forward_only_differs_in_magnitude() {
        let fwd = actuate("fwd 20");
        let ffwd = actuate("ffwd 20");
        assert_eq!(throttles(&ffwd), (-1.0, -1.0));
        assert_eq!(fwd.motor1.value().signum(), ffwd.motor1.value().signum());
        assert_eq!(fwd.duration, ffwd.duration);
    }

    #[test]
    fn test_forward_and_back_are_mirrors() {
        for n in [1, 50, 300] {
            assert_eq!(actuate(&format!("fwd {n}")).mirrored(), actuate(&format!("bck {n}")));
        }
    }

    #[test]
    fn test_left_and_right_are_mirrors() {
        for a in [0, 45, 90, 180, 360] {
            let lt = actuate(&format!("lt {a}"));
            let rt = actuate(&format!("rt {a}"));
            assert_eq!(lt.mirrored(), rt);
            // Differential: channels always opposed
            assert_eq!(lt.motor1.value(), -lt.motor2.value());
        }
    }

    #[test]
    fn test_right_scenario() {
        let spin = Calibration::default().spin_duration;
        let plan = actuate("rt 180");
        assert_eq!(plan.duration, spin * 2);
        assert_eq!(throttles(&plan), (-0.75, 0.75));
    }

    #[test]
    fn test_spin_duration_scales_linearly() {
        let spin = Calibration::default().spin_duration;
        assert_eq!(actuate("lt 90").duration, spin);
        assert_eq!(actuate("lt 180").duration, spin * 2);
        assert_eq!(actuate("rt 45").duration, spin / 2);
        assert_eq!(actuate("rt 0").duration, Duration::ZERO);
    }

    #[test]
    fn test_custom_calibration() {
        let interpreter = Interpreter::new(Calibration {
            cruise_throttle: 0.5,
            full_throttle: 0.9,
            spin_throttle: 0.25,
            spin_duration: Duration::from_millis(1500),
            spin_angle_deg: 90.0,
        });

        let Ok(Instruction::Actuate(plan)) = interpreter.interpret("rt 90") else {
            panic!("expected actuation");
        };
        assert_eq!(plan.duration, Duration::from_millis(1500));
        assert_eq!(throttles(&plan), (-0.25, 0.25));

        let Ok(Instruction::Actuate(plan)) = interpreter.interpret("bck 3") else {
            panic!("expected actuation");
        };
        assert_eq!(throttles(&plan), (0.5, 0.5));
        assert_eq!(plan.duration, Duration::from_millis(30));
    }

    #[test]
    fn test_error_scenarios() {
        let interpreter = Interpreter::default();
        assert!(matches!(
            interpreter.interpret("spin 1"),
            Err(CommandError::UnknownCommand(_))
        ));
        assert_eq!(interpreter.interpret(""), Err(CommandError::InvalidCommand));
        assert!(matches!(
            interpreter.interpret("fwd"),
            Err(CommandError::InvalidArguments { verb: Verb::Forward, .. })
        ));
    }

    #[test]
    fn test_overflowing_duration_is_rejected() {
        let interpreter = Interpreter::default();
        assert!(matches!(
            interpreter.interpret(&format!("fwd {}", u64::MAX)),
            Err(CommandError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn test_tokenized_command_without_argument() {
        let command = Command {
            verb: Verb::Left,
            arg: None,
        };
        assert!(matches!(
            Interpreter::default().plan(&command),
            Err(CommandError::InvalidArguments { verb: Verb::Left, .. })
        ));
    }
}
