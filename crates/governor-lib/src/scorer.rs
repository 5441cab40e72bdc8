//! Composite performance scoring
//!
//! Combines frame rate, memory and thermal sub-scores into a single value in
//! `[0, 1]` and maps it onto a [`PerformanceLevel`]. The three signals are
//! weighted equally: one degraded signal cannot be masked by two healthy ones,
//! and only a deeply degraded one (thermal critical) zeroes its own term.

use crate::metrics::ScoreInputs;
use crate::models::{PerformanceLevel, ThermalState};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Composite score at or above which the level is optimal
pub const OPTIMAL_THRESHOLD: f64 = 0.8;
/// Composite score at or above which the level is good
pub const GOOD_THRESHOLD: f64 = 0.6;
/// Composite score at or above which the level is fair
pub const FAIR_THRESHOLD: f64 = 0.4;

/// Sub-scores and the level they produced
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub frame_rate_score: f64,
    pub memory_score: f64,
    pub thermal_score: f64,
    pub composite: f64,
    pub level: PerformanceLevel,
}

impl Default for ScoreBreakdown {
    fn default() -> Self {
        Self {
            frame_rate_score: 1.0,
            memory_score: 1.0,
            thermal_score: 1.0,
            composite: 1.0,
            level: PerformanceLevel::Optimal,
        }
    }
}

/// Maps rolling signals to a composite score and level
#[derive(Debug, Clone)]
pub struct PerformanceScorer {
    target_frame_interval: Duration,
}

impl PerformanceScorer {
    pub fn new(target_frame_interval: Duration) -> Self {
        Self {
            target_frame_interval,
        }
    }

    /// `min(1, target / average)`; a missing or zero average scores 1.0
    pub fn frame_rate_score(&self, average_frame_time: Option<f64>) -> f64 {
        match average_frame_time {
            Some(avg) if avg > 0.0 => (self.target_frame_interval.as_secs_f64() / avg).min(1.0),
            _ => 1.0,
        }
    }

    pub fn memory_score(used_fraction: f64) -> f64 {
        (1.0 - used_fraction).clamp(0.0, 1.0)
    }

    pub fn thermal_score(state: ThermalState) -> f64 {
        match state {
            ThermalState::Nominal => 1.0,
            ThermalState::Fair => 0.8,
            ThermalState::Serious => 0.4,
            ThermalState::Critical => 0.0,
        }
    }

    /// Closed-open bands: `[0.8, 1]` optimal, `[0.6, 0.8)` good, `[0.4, 0.6)` fair
    pub fn level_for(composite: f64) -> PerformanceLevel {
        if composite >= OPTIMAL_THRESHOLD {
            PerformanceLevel::Optimal
        } else if composite >= GOOD_THRESHOLD {
            PerformanceLevel::Good
        } else if composite >= FAIR_THRESHOLD {
            PerformanceLevel::Fair
        } else {
            PerformanceLevel::Poor
        }
    }

    pub fn score(&self, inputs: &ScoreInputs) -> ScoreBreakdown {
        let frame_rate_score = self.frame_rate_score(inputs.average_frame_time);
        let memory_score = Self::memory_score(inputs.memory_used_fraction);
        let thermal_score = Self::thermal_score(inputs.thermal);
        let composite = (frame_rate_score + memory_score + thermal_score) / 3.0;

        ScoreBreakdown {
            frame_rate_score,
            memory_score,
            thermal_score,
            composite,
            level: Self::level_for(composite),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RollingMetricBuffer;

    fn scorer() -> PerformanceScorer {
        PerformanceScorer::new(Duration::from_secs_f64(1.0 / 60.0))
    }

    fn inputs(avg: Option<f64>, memory: f64, thermal: ThermalState) -> ScoreInputs {
        ScoreInputs {
            average_frame_time: avg,
            memory_used_fraction: memory,
            thermal,
        }
    }

    #[test]
    fn test_level_boundaries_are_closed_open() {
        assert_eq!(PerformanceScorer::level_for(0.8), PerformanceLevel::Optimal);
        assert_eq!(PerformanceScorer::level_for(0.79999), PerformanceLevel::Good);
        assert_eq!(PerformanceScorer::level_for(0.6), PerformanceLevel::Good);
        assert_eq!(PerformanceScorer::level_for(0.59999), PerformanceLevel::Fair);
        assert_eq!(PerformanceScorer::level_for(0.4), PerformanceLevel::Fair);
        assert_eq!(PerformanceScorer::level_for(0.39999), PerformanceLevel::Poor);
        assert_eq!(PerformanceScorer::level_for(1.0), PerformanceLevel::Optimal);
        assert_eq!(PerformanceScorer::level_for(0.0), PerformanceLevel::Poor);
    }

    #[test]
    fn test_frame_score_caps_at_one() {
        let scorer = scorer();
        assert_eq!(scorer.frame_rate_score(Some(1.0 / 120.0)), 1.0);
        assert_eq!(scorer.frame_rate_score(None), 1.0);
        assert!((scorer.frame_rate_score(Some(2.0 / 60.0)) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_slower_frames_never_raise_score() {
        let scorer = scorer();
        let mut previous = f64::INFINITY;

        for step in 0..200 {
            let avg = 1.0 / 120.0 + step as f64 * 0.001;
            let breakdown = scorer.score(&inputs(Some(avg), 0.3, ThermalState::Fair));
            assert!(breakdown.composite <= previous);
            previous = breakdown.composite;
        }
    }

    #[test]
    fn test_thermal_table() {
        assert_eq!(PerformanceScorer::thermal_score(ThermalState::Nominal), 1.0);
        assert_eq!(PerformanceScorer::thermal_score(ThermalState::Fair), 0.8);
        assert_eq!(PerformanceScorer::thermal_score(ThermalState::Serious), 0.4);
        assert_eq!(PerformanceScorer::thermal_score(ThermalState::Critical), 0.0);
    }

    #[test]
    fn test_critical_thermal_zeroes_term() {
        let breakdown = scorer().score(&inputs(Some(1.0 / 60.0), 0.0, ThermalState::Critical));
        assert_eq!(breakdown.thermal_score, 0.0);
        assert!(breakdown.composite <= 2.0 / 3.0 + 1e-9);
        assert!(breakdown.level >= PerformanceLevel::Good);
    }

    #[test]
    fn test_memory_score_is_clamped() {
        assert_eq!(PerformanceScorer::memory_score(1.2), 0.0);
        assert_eq!(PerformanceScorer::memory_score(-0.1), 1.0);
    }

    #[test]
    fn test_target_rate_half_memory_is_optimal() {
        let target = 1.0 / 60.0;
        let mut frames = RollingMetricBuffer::new(120);
        for _ in 0..120 {
            frames.append(target);
        }

        let breakdown = scorer().score(&inputs(Some(frames.average()), 0.5, ThermalState::Nominal));

        assert!((breakdown.frame_rate_score - 1.0).abs() < 1e-6);
        assert!((breakdown.composite - 2.5 / 3.0).abs() < 1e-6);
        assert_eq!(breakdown.level, PerformanceLevel::Optimal);
    }
}
