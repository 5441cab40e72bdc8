//! Governor configuration
//!
//! All tunables have defaults matching a 60 Hz wearable display. Hosts load
//! overrides through whatever configuration layer they use; every struct here
//! deserializes with `#[serde(default)]` so partial documents are accepted.

use crate::error::{GovernorError, Result};
use crate::models::PowerMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level governor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Expected display refresh rate in Hz
    pub target_frame_rate: f64,
    /// Frame-time samples retained (~2 seconds at the target rate)
    pub frame_buffer_capacity: usize,
    /// Memory samples retained (~60 seconds at 1 Hz)
    pub memory_buffer_capacity: usize,
    /// Thermal transitions retained for trend reporting
    pub thermal_buffer_capacity: usize,
    /// A frame slower than this multiple of the target interval counts as dropped
    pub dropped_frame_factor: f64,
    /// Dropped frames inside the window before an out-of-cycle evaluation
    pub frame_drop_threshold: u32,
    /// Rolling window for frame-drop escalation
    pub frame_drop_window_ms: u64,
    /// Periodic scoring interval
    pub sample_interval_ms: u64,
    /// Capacity of the owner task's event channels
    pub channel_capacity: usize,
    pub policy: PolicyThresholds,
    pub pressure: PressureConfig,
    pub power: PowerIntervals,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            target_frame_rate: 60.0,
            frame_buffer_capacity: 120,
            memory_buffer_capacity: 60,
            thermal_buffer_capacity: 30,
            dropped_frame_factor: 1.5,
            frame_drop_threshold: 5,
            frame_drop_window_ms: 1000,
            sample_interval_ms: 1000,
            channel_capacity: 1024,
            policy: PolicyThresholds::default(),
            pressure: PressureConfig::default(),
            power: PowerIntervals::default(),
        }
    }
}

impl GovernorConfig {
    /// Target frame interval derived from the refresh rate
    pub fn target_frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_frame_rate)
    }

    pub fn frame_drop_window(&self) -> Duration {
        Duration::from_millis(self.frame_drop_window_ms)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Reject configurations the control loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.target_frame_rate.is_finite() && self.target_frame_rate > 0.0) {
            return Err(GovernorError::InvalidConfig(format!(
                "target_frame_rate must be positive, got {}",
                self.target_frame_rate
            )));
        }
        if !(self.dropped_frame_factor.is_finite() && self.dropped_frame_factor >= 1.0) {
            return Err(GovernorError::InvalidConfig(format!(
                "dropped_frame_factor must be a finite value of at least 1.0, got {}",
                self.dropped_frame_factor
            )));
        }
        if self.sample_interval_ms == 0 || self.channel_capacity == 0 {
            return Err(GovernorError::InvalidConfig(
                "sample_interval_ms and channel_capacity must be non-zero".to_string(),
            ));
        }
        self.policy.validate()?;
        self.pressure.validate()?;
        self.power.validate()
    }
}

/// Thresholds feeding the policy precedence rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyThresholds {
    /// Memory pressure above which the aggressive profile is forced
    pub aggressive_memory_pressure: f64,
    /// Memory pressure above which at least the moderate profile applies
    pub moderate_memory_pressure: f64,
    /// Battery fraction below which at least the moderate profile applies
    pub low_battery_level: f32,
}

impl Default for PolicyThresholds {
    fn default() -> Self {
        Self {
            aggressive_memory_pressure: 0.8,
            moderate_memory_pressure: 0.6,
            low_battery_level: 0.3,
        }
    }
}

impl PolicyThresholds {
    fn validate(&self) -> Result<()> {
        if self.moderate_memory_pressure > self.aggressive_memory_pressure {
            return Err(GovernorError::InvalidConfig(
                "moderate_memory_pressure must not exceed aggressive_memory_pressure".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.low_battery_level) {
            return Err(GovernorError::InvalidConfig(
                "low_battery_level must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pressure responder tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureConfig {
    /// Interval between routine cleanups
    pub routine_interval_secs: u64,
    /// Memory pressure considered high for sustained-pressure detection
    pub sustained_threshold: f64,
    /// Consecutive high samples that trigger an early routine cleanup
    pub sustained_samples: u32,
    /// Memory pressure below which emergency mode may end
    pub recovery_threshold: f64,
    /// Consecutive samples below the recovery threshold before resuming services
    pub recovery_samples: u32,
}

impl Default for PressureConfig {
    fn default() -> Self {
        Self {
            routine_interval_secs: 30,
            sustained_threshold: 0.8,
            sustained_samples: 3,
            recovery_threshold: 0.6,
            recovery_samples: 3,
        }
    }
}

impl PressureConfig {
    pub fn routine_interval(&self) -> Duration {
        Duration::from_secs(self.routine_interval_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.routine_interval_secs == 0 {
            return Err(GovernorError::InvalidConfig(
                "routine_interval_secs must be non-zero".to_string(),
            ));
        }
        if self.recovery_threshold > self.sustained_threshold {
            return Err(GovernorError::InvalidConfig(
                "recovery_threshold must not exceed sustained_threshold".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sync intervals per power mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerIntervals {
    pub normal_secs: u64,
    pub conservative_secs: u64,
    pub aggressive_secs: u64,
    pub extreme_secs: u64,
}

impl Default for PowerIntervals {
    fn default() -> Self {
        Self {
            normal_secs: 60,
            conservative_secs: 120,
            aggressive_secs: 300,
            extreme_secs: 600,
        }
    }
}

impl PowerIntervals {
    pub fn interval_for(&self, mode: PowerMode) -> Duration {
        let secs = match mode {
            PowerMode::Normal => self.normal_secs,
            PowerMode::Conservative => self.conservative_secs,
            PowerMode::Aggressive => self.aggressive_secs,
            PowerMode::Extreme => self.extreme_secs,
        };
        Duration::from_secs(secs)
    }

    /// Stricter modes must never sync more often than laxer ones
    fn validate(&self) -> Result<()> {
        let ordered = [
            self.normal_secs,
            self.conservative_secs,
            self.aggressive_secs,
            self.extreme_secs,
        ];
        if self.normal_secs == 0 {
            return Err(GovernorError::InvalidConfig(
                "power.normal_secs must be non-zero".to_string(),
            ));
        }
        if ordered.windows(2).any(|w| w[1] < w[0]) {
            return Err(GovernorError::InvalidConfig(
                "power intervals must be non-decreasing from normal to extreme".to_string(),
            ));
        }
        Ok(())
    }
}
