//! Actuation plans: what the motors should do and for how long

use std::fmt;
use std::time::Duration;

/// Signed throttle for one motor channel, always within [-1.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Throttle(f64);

impl Throttle {
    pub const STOP: Throttle = Throttle(0.0);
    pub const MAX: f64 = 1.0;

    /// Create a throttle, clamping into [-1.0, 1.0]. NaN becomes a stop.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::STOP;
        }
        Self(value.clamp(-Self::MAX, Self::MAX))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_stop(&self) -> bool {
        self.0 == 0.0
    }
}

impl std::ops::Neg for Throttle {
    type Output = Throttle;

    fn neg(self) -> Self::Output {
        Throttle(-self.0)
    }
}

/// Two fraction digits, as the motor adapter expects. Never prints "-0.00".
impl fmt::Display for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.0 == 0.0 { 0.0 } else { self.0 };
        write!(f, "{value:.2}")
    }
}

/// Motor channels addressed by the drive adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorChannel {
    Motor1,
    Motor2,
}

impl MotorChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotorChannel::Motor1 => "motor1",
            MotorChannel::Motor2 => "motor2",
        }
    }

    /// Adapter argument for this channel, e.g. `motor1:-0.75`
    pub fn arg(&self, throttle: Throttle) -> String {
        format!("{}:{}", self.as_str(), throttle)
    }
}

impl fmt::Display for MotorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Throttle pair plus how long to hold it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuationPlan {
    pub motor1: Throttle,
    pub motor2: Throttle,
    pub duration: Duration,
}

impl ActuationPlan {
    pub fn new(motor1: Throttle, motor2: Throttle, duration: Duration) -> Self {
        Self {
            motor1,
            motor2,
            duration,
        }
    }

    /// Same duration, both throttles sign-flipped
    pub fn mirrored(&self) -> Self {
        Self::new(-self.motor1, -self.motor2, self.duration)
    }

    /// Adapter arguments that start this plan
    pub fn drive_args(&self) -> Vec<String> {
        vec![
            MotorChannel::Motor1.arg(self.motor1),
            MotorChannel::Motor2.arg(self.motor2),
        ]
    }

    /// Adapter arguments that stop both channels
    pub fn stop_args() -> Vec<String> {
        vec![
            MotorChannel::Motor1.arg(Throttle::STOP),
            MotorChannel::Motor2.arg(Throttle::STOP),
        ]
    }
}
