//! Power mode and battery tracking
//!
//! The battery subsystem owns the power mode; the governor only observes it.
//! Each mode maps to a background sync interval and a multiplier on the
//! monitoring cadence. Both are non-decreasing from `normal` to `extreme`.

use crate::config::PowerIntervals;
use crate::models::PowerMode;
use crate::subsystems::BackgroundServices;
use std::time::Duration;
use tracing::{info, warn};

pub struct PowerModeCoordinator {
    intervals: PowerIntervals,
    mode: PowerMode,
    battery_level: f32,
    /// Battery fraction the policy treats as low; crossings are logged
    low_battery_mark: f32,
}

impl PowerModeCoordinator {
    pub fn new(intervals: PowerIntervals, low_battery_mark: f32) -> Self {
        Self {
            intervals,
            mode: PowerMode::Normal,
            battery_level: 1.0,
            low_battery_mark,
        }
    }

    pub fn mode(&self) -> PowerMode {
        self.mode
    }

    pub fn battery_level(&self) -> f32 {
        self.battery_level
    }

    pub fn is_battery_low(&self) -> bool {
        self.battery_level < self.low_battery_mark
    }

    pub fn sync_interval(&self) -> Duration {
        self.intervals.interval_for(self.mode)
    }

    /// Multiplier applied to the monitoring interval under the current mode
    pub fn monitoring_multiplier(&self) -> u32 {
        let base = self.intervals.normal_secs.max(1);
        let current = self.intervals.interval_for(self.mode).as_secs();
        u32::try_from(current / base).unwrap_or(u32::MAX).max(1)
    }

    /// Record a new mode and push the matching sync interval.
    ///
    /// Returns false when the mode is unchanged.
    pub fn set_mode(&mut self, mode: PowerMode, background: &mut dyn BackgroundServices) -> bool {
        if mode == self.mode {
            return false;
        }

        let previous = self.mode;
        self.mode = mode;
        let interval = self.sync_interval();
        background.set_sync_interval(interval);

        info!(
            from = previous.as_str(),
            to = mode.as_str(),
            sync_interval_secs = interval.as_secs(),
            monitoring_multiplier = self.monitoring_multiplier(),
            "Power mode changed"
        );
        true
    }

    /// Record a battery reading, clamped to `[0, 1]`.
    ///
    /// Returns false when the reading is unchanged.
    pub fn set_battery_level(&mut self, level: f32) -> bool {
        let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
        if (level - self.battery_level).abs() < f32::EPSILON {
            return false;
        }

        let previous = self.battery_level;
        self.battery_level = level;

        let mark = self.low_battery_mark;
        if previous >= mark && level < mark {
            warn!(battery_level = level, low_battery_mark = mark, "Battery dropped below low mark");
        } else if previous < mark && level >= mark {
            info!(battery_level = level, low_battery_mark = mark, "Battery back above low mark");
        }
        true
    }
}
