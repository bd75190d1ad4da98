//! Device configuration
//!
//! Read once from the environment by `main` and passed down. Nothing below
//! this module looks at the environment.

use crate::adapter::{MOTOR_ADAPTER_SETTING, SCRIPT_ADAPTER_SETTING};
use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use yakapi_shared::Calibration;

pub const ADAPTER_TIMEOUT_SETTING: &str = "YAKAPI_ADAPTER_TIMEOUT_MS";
pub const SCRIPT_TIMEOUT_SETTING: &str = "YAKAPI_CI_TIMEOUT_MS";
pub const MAX_HOLD_SETTING: &str = "YAKAPI_MAX_HOLD_MS";
pub const CRUISE_THROTTLE_SETTING: &str = "YAKAPI_THROTTLE_CRUISE";
pub const FULL_THROTTLE_SETTING: &str = "YAKAPI_THROTTLE_FULL";
pub const SPIN_THROTTLE_SETTING: &str = "YAKAPI_THROTTLE_SPIN";
pub const SPIN_DURATION_SETTING: &str = "YAKAPI_SPIN_DURATION_MS";

/// Per-call deadline for motor adapter invocations
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 5000;

/// Adapter executables and their limits
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    /// Drive/stop adapter; absence is reported when a drive is attempted
    pub motor_adapter: Option<PathBuf>,
    /// Script adapter; absence is reported when a script is run
    pub script_adapter: Option<PathBuf>,
    /// Deadline for each motor adapter call (not the hold between them)
    pub call_timeout: Duration,
    /// Deadline for a script run, unbounded when `None`
    pub script_timeout: Option<Duration>,
    /// Longest hold a single command may request, unbounded when `None`
    pub max_hold: Option<Duration>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            motor_adapter: None,
            script_adapter: None,
            call_timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
            script_timeout: None,
            max_hold: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceConfig {
    pub adapters: AdapterConfig,
    pub calibration: Calibration,
}

impl DeviceConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let adapters = AdapterConfig {
            motor_adapter: get(MOTOR_ADAPTER_SETTING).map(PathBuf::from),
            script_adapter: get(SCRIPT_ADAPTER_SETTING).map(PathBuf::from),
            call_timeout: match get(ADAPTER_TIMEOUT_SETTING) {
                Some(v) => positive_millis(ADAPTER_TIMEOUT_SETTING, &v)?,
                None => defaults.adapters.call_timeout,
            },
            script_timeout: get(SCRIPT_TIMEOUT_SETTING)
                .map(|v| positive_millis(SCRIPT_TIMEOUT_SETTING, &v))
                .transpose()?,
            max_hold: get(MAX_HOLD_SETTING)
                .map(|v| positive_millis(MAX_HOLD_SETTING, &v))
                .transpose()?,
        };

        let mut calibration = defaults.calibration;
        if let Some(v) = get(CRUISE_THROTTLE_SETTING) {
            calibration.cruise_throttle = magnitude(CRUISE_THROTTLE_SETTING, &v)?;
        }
        if let Some(v) = get(FULL_THROTTLE_SETTING) {
            calibration.full_throttle = magnitude(FULL_THROTTLE_SETTING, &v)?;
        }
        if let Some(v) = get(SPIN_THROTTLE_SETTING) {
            calibration.spin_throttle = magnitude(SPIN_THROTTLE_SETTING, &v)?;
        }
        if let Some(v) = get(SPIN_DURATION_SETTING) {
            calibration.spin_duration = positive_millis(SPIN_DURATION_SETTING, &v)?;
        }

        Ok(Self {
            adapters,
            calibration,
        })
    }
}

fn positive_millis(key: &str, value: &str) -> Result<Duration> {
    let ms: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("{key}: expected milliseconds, got {value:?}"))?;
    if ms == 0 {
        bail!("{key}: must be greater than zero");
    }
    Ok(Duration::from_millis(ms))
}

/// Throttle magnitude in (0, 1]
fn magnitude(key: &str, value: &str) -> Result<f64> {
    let v: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("{key}: expected a number, got {value:?}"))?;
    if v > 0.0 && v <= 1.0 {
        Ok(v)
    } else {
        Err(anyhow!("{key}: {v} is outside (0, 1]"))
    }
}
