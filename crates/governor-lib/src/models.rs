//! Core data models for the performance governor

use crate::error::GovernorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OS thermal state, ordered from coolest to hottest
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ThermalState {
    #[default]
    Nominal,
    Fair,
    Serious,
    Critical,
}

impl ThermalState {
    pub const ALL: [ThermalState; 4] = [
        ThermalState::Nominal,
        ThermalState::Fair,
        ThermalState::Serious,
        ThermalState::Critical,
    ];

    /// Raw ordinal stored in the thermal history buffer
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThermalState::Nominal => "nominal",
            ThermalState::Fair => "fair",
            ThermalState::Serious => "serious",
            ThermalState::Critical => "critical",
        }
    }
}

impl fmt::Display for ThermalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThermalState {
    type Err = GovernorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GovernorError::unknown("thermal state", s))
    }
}

/// Discrete performance level derived from the composite score.
///
/// Ordered from best to worst, so `level >= PerformanceLevel::Fair` reads as
/// "fair or worse".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceLevel {
    #[default]
    Optimal,
    Good,
    Fair,
    Poor,
}

impl PerformanceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            PerformanceLevel::Optimal => "optimal",
            PerformanceLevel::Good => "good",
            PerformanceLevel::Fair => "fair",
            PerformanceLevel::Poor => "poor",
        }
    }

    /// Ordinal exported as a Prometheus gauge (0 = optimal, 3 = poor)
    pub fn ordinal(self) -> i64 {
        self as i64
    }
}

impl fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user is currently doing, as declared by the host application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityContext {
    #[default]
    Idle,
    Scorecard,
    Navigation,
    HealthTracking,
    Sync,
    Menu,
}

impl ActivityContext {
    pub const ALL: [ActivityContext; 6] = [
        ActivityContext::Idle,
        ActivityContext::Scorecard,
        ActivityContext::Navigation,
        ActivityContext::HealthTracking,
        ActivityContext::Sync,
        ActivityContext::Menu,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityContext::Idle => "idle",
            ActivityContext::Scorecard => "scorecard",
            ActivityContext::Navigation => "navigation",
            ActivityContext::HealthTracking => "health_tracking",
            ActivityContext::Sync => "sync",
            ActivityContext::Menu => "menu",
        }
    }
}

impl fmt::Display for ActivityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityContext {
    type Err = GovernorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|ctx| ctx.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| GovernorError::unknown("activity context", s))
    }
}

/// Power-saving mode reported by the battery subsystem, ordered by strictness
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PowerMode {
    #[default]
    Normal,
    Conservative,
    Aggressive,
    Extreme,
}

impl PowerMode {
    pub const ALL: [PowerMode; 4] = [
        PowerMode::Normal,
        PowerMode::Conservative,
        PowerMode::Aggressive,
        PowerMode::Extreme,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PowerMode::Normal => "normal",
            PowerMode::Conservative => "conservative",
            PowerMode::Aggressive => "aggressive",
            PowerMode::Extreme => "extreme",
        }
    }
}

impl fmt::Display for PowerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerMode {
    type Err = GovernorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GovernorError::unknown("power mode", s))
    }
}

/// Level carried by an OS memory-pressure notification
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MemoryPressureLevel {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl MemoryPressureLevel {
    pub const ALL: [MemoryPressureLevel; 3] = [
        MemoryPressureLevel::Normal,
        MemoryPressureLevel::Warning,
        MemoryPressureLevel::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MemoryPressureLevel::Normal => "normal",
            MemoryPressureLevel::Warning => "warning",
            MemoryPressureLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for MemoryPressureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryPressureLevel {
    type Err = GovernorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GovernorError::unknown("memory pressure level", s))
    }
}

/// Process memory usage at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub total_bytes: u64,
}

impl MemoryUsage {
    pub fn new(used_bytes: u64, total_bytes: u64) -> Self {
        Self {
            used_bytes,
            available_bytes: total_bytes.saturating_sub(used_bytes),
            total_bytes,
        }
    }

    /// Fraction of total memory in use, in `[0, 1]`
    pub fn used_percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.used_bytes as f64 / self.total_bytes as f64).clamp(0.0, 1.0)
    }
}

/// Accumulated dwell time for one activity context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextProfileEntry {
    pub context: ActivityContext,
    pub total_secs: f64,
    pub visits: u32,
}

/// Read-only snapshot of governor state for external consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub generated_at: i64,
    pub monitoring: bool,
    pub frame_rate: f64,
    pub average_frame_time_ms: f64,
    pub dropped_frame_percentage: f64,
    pub memory: MemoryUsage,
    pub memory_used_percentage: f64,
    pub thermal_state: ThermalState,
    pub thermal_trend: f64,
    pub composite_score: f64,
    pub performance_level: PerformanceLevel,
    pub activity_context: ActivityContext,
    pub power_mode: PowerMode,
    pub battery_level: f32,
    pub sync_interval_secs: u64,
    pub emergency_active: bool,
    pub active_optimizations: Vec<String>,
    pub context_profile: Vec<ContextProfileEntry>,
}
