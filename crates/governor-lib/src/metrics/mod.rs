//! Metrics collection for the governor
//!
//! Three independent signals feed rolling buffers:
//! - frame timing, driven by the display refresh cycle
//! - memory usage, sampled on the periodic tick through a [`MemoryProbe`]
//! - thermal state, recorded on every OS transition notification

mod frame;
mod memory;
mod thermal;

pub use frame::{FrameSample, FrameTimer};
pub use memory::{FixedMemoryProbe, MemoryProbe, MemorySampler, SystemMemoryProbe};
pub use thermal::ThermalMonitor;

use crate::config::GovernorConfig;
use crate::models::{MemoryUsage, ThermalState};
use std::time::Instant;

/// Signals the scorer consumes each cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    /// Average frame time in seconds, `None` before any frame was timed
    pub average_frame_time: Option<f64>,
    /// Fraction of memory in use
    pub memory_used_fraction: f64,
    pub thermal: ThermalState,
}

/// Owns the rolling buffers for every signal
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    frames: FrameTimer,
    memory: MemorySampler,
    thermal: ThermalMonitor,
}

impl MetricsCollector {
    pub fn new(config: &GovernorConfig) -> Self {
        Self {
            frames: FrameTimer::new(
                config.target_frame_interval(),
                config.frame_buffer_capacity,
                config.dropped_frame_factor,
                config.frame_drop_threshold,
                config.frame_drop_window(),
            ),
            memory: MemorySampler::new(config.memory_buffer_capacity),
            thermal: ThermalMonitor::new(config.thermal_buffer_capacity),
        }
    }

    /// Frame-timing loop body, called once per display refresh
    pub fn record_frame(&mut self, now: Instant) -> Option<FrameSample> {
        self.frames.on_refresh(now)
    }

    /// Memory-sampling loop body, called on the periodic tick
    pub fn sample_memory(&mut self, probe: &mut dyn MemoryProbe) -> MemoryUsage {
        let usage = probe.sample();
        self.memory.record(usage);
        usage
    }

    /// Thermal loop body; returns true when the state changed
    pub fn record_thermal(&mut self, state: ThermalState) -> bool {
        self.thermal.record(state)
    }

    pub fn score_inputs(&self) -> ScoreInputs {
        ScoreInputs {
            average_frame_time: self.frames.average_frame_time(),
            memory_used_fraction: self.memory.latest().used_percentage(),
            thermal: self.thermal.current(),
        }
    }

    pub fn frames(&self) -> &FrameTimer {
        &self.frames
    }

    pub fn memory(&self) -> &MemorySampler {
        &self.memory
    }

    pub fn thermal(&self) -> &ThermalMonitor {
        &self.thermal
    }

    /// Clear every buffer and counter
    pub fn reset(&mut self) {
        self.frames.reset();
        self.memory.reset();
        self.thermal.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_score_inputs_reflect_signals() {
        let config = GovernorConfig::default();
        let mut collector = MetricsCollector::new(&config);
        let mut probe = FixedMemoryProbe::new(250, 1000);

        let start = Instant::now();
        collector.record_frame(start);
        collector.record_frame(start + Duration::from_millis(20));
        collector.sample_memory(&mut probe);
        collector.record_thermal(ThermalState::Fair);

        let inputs = collector.score_inputs();
        assert!((inputs.average_frame_time.unwrap() - 0.020).abs() < 1e-9);
        assert!((inputs.memory_used_fraction - 0.25).abs() < 1e-9);
        assert_eq!(inputs.thermal, ThermalState::Fair);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let config = GovernorConfig::default();
        let mut collector = MetricsCollector::new(&config);
        let mut probe = FixedMemoryProbe::new(900, 1000);

        collector.sample_memory(&mut probe);
        collector.record_thermal(ThermalState::Critical);
        collector.reset();

        let inputs = collector.score_inputs();
        assert_eq!(inputs.average_frame_time, None);
        assert_eq!(inputs.memory_used_fraction, 0.0);
        assert_eq!(inputs.thermal, ThermalState::Nominal);
    }
}
