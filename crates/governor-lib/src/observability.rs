//! Observability for the performance governor
//!
//! Provides:
//! - Prometheus metrics (score, level, frame rate, memory, thermal, policy and cleanup counters)
//! - Structured JSON logging with tracing

use crate::models::{ActivityContext, PerformanceLevel, PowerMode, ThermalState};
use crate::policy::{OptimizationDirectiveSet, PolicyReason};
use crate::pressure::CleanupSeverity;
use prometheus::{
    register_gauge, register_gauge_vec, register_histogram, register_int_counter,
    register_int_counter_vec, register_int_gauge, Gauge, GaugeVec, Histogram, IntCounter,
    IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Buckets for policy evaluation latency (in seconds)
const EVALUATION_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.05,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<GovernorMetricsInner> = OnceLock::new();

struct GovernorMetricsInner {
    composite_score: Gauge,
    performance_level: IntGauge,
    frame_rate: Gauge,
    dropped_frames: IntCounter,
    frame_drop_escalations: IntCounter,
    memory_used_ratio: Gauge,
    thermal_state: IntGauge,
    battery_level: Gauge,
    power_mode_info: GaugeVec,
    emergency_active: IntGauge,
    policy_applications: IntCounter,
    cleanups: IntCounterVec,
    evaluation_latency_seconds: Histogram,
}

impl GovernorMetricsInner {
    fn new() -> Self {
        Self {
            composite_score: register_gauge!(
                "perf_governor_composite_score",
                "Composite performance score in [0, 1]"
            )
            .expect("Failed to register composite_score"),

            performance_level: register_int_gauge!(
                "perf_governor_performance_level",
                "Performance level (0 optimal, 1 good, 2 fair, 3 poor)"
            )
            .expect("Failed to register performance_level"),

            frame_rate: register_gauge!(
                "perf_governor_frame_rate",
                "Frame rate derived from the rolling frame-time average"
            )
            .expect("Failed to register frame_rate"),

            dropped_frames: register_int_counter!(
                "perf_governor_dropped_frames_total",
                "Frames that exceeded the dropped-frame threshold"
            )
            .expect("Failed to register dropped_frames"),

            frame_drop_escalations: register_int_counter!(
                "perf_governor_frame_drop_escalations_total",
                "Out-of-cycle evaluations caused by bursts of dropped frames"
            )
            .expect("Failed to register frame_drop_escalations"),

            memory_used_ratio: register_gauge!(
                "perf_governor_memory_used_ratio",
                "Fraction of memory in use at the last sample"
            )
            .expect("Failed to register memory_used_ratio"),

            thermal_state: register_int_gauge!(
                "perf_governor_thermal_state",
                "Thermal state ordinal (0 nominal to 3 critical)"
            )
            .expect("Failed to register thermal_state"),

            battery_level: register_gauge!(
                "perf_governor_battery_level",
                "Battery charge fraction"
            )
            .expect("Failed to register battery_level"),

            power_mode_info: register_gauge_vec!(
                "perf_governor_power_mode_info",
                "Currently observed power mode",
                &["mode"]
            )
            .expect("Failed to register power_mode_info"),

            emergency_active: register_int_gauge!(
                "perf_governor_emergency_active",
                "1 while emergency memory mode is active"
            )
            .expect("Failed to register emergency_active"),

            policy_applications: register_int_counter!(
                "perf_governor_policy_applications_total",
                "Directive sets pushed to subsystems"
            )
            .expect("Failed to register policy_applications"),

            cleanups: register_int_counter_vec!(
                "perf_governor_cleanups_total",
                "Cleanup passes by severity",
                &["severity"]
            )
            .expect("Failed to register cleanups"),

            evaluation_latency_seconds: register_histogram!(
                "perf_governor_evaluation_latency_seconds",
                "Time spent scoring and evaluating policy",
                EVALUATION_BUCKETS.to_vec()
            )
            .expect("Failed to register evaluation_latency_seconds"),
        }
    }
}

/// Governor metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share it.
#[derive(Clone)]
pub struct GovernorMetrics {
    _private: (),
}

impl Default for GovernorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl GovernorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(GovernorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &GovernorMetricsInner {
        GLOBAL_METRICS.get_or_init(GovernorMetricsInner::new)
    }

    pub fn set_score(&self, composite: f64, level: PerformanceLevel) {
        self.inner().composite_score.set(composite);
        self.inner().performance_level.set(level.ordinal());
    }

    pub fn set_frame_rate(&self, fps: f64) {
        self.inner().frame_rate.set(fps);
    }

    pub fn inc_dropped_frames(&self) {
        self.inner().dropped_frames.inc();
    }

    pub fn inc_frame_drop_escalations(&self) {
        self.inner().frame_drop_escalations.inc();
    }

    pub fn set_memory_used_ratio(&self, ratio: f64) {
        self.inner().memory_used_ratio.set(ratio);
    }

    pub fn set_thermal_state(&self, state: ThermalState) {
        self.inner().thermal_state.set(i64::from(state.ordinal()));
    }

    pub fn set_battery_level(&self, level: f32) {
        self.inner().battery_level.set(f64::from(level));
    }

    /// Replace the power mode info series
    pub fn set_power_mode(&self, mode: PowerMode) {
        self.inner().power_mode_info.reset();
        self.inner()
            .power_mode_info
            .with_label_values(&[mode.as_str()])
            .set(1.0);
    }

    pub fn set_emergency_active(&self, active: bool) {
        self.inner().emergency_active.set(i64::from(active));
    }

    pub fn inc_policy_applications(&self) {
        self.inner().policy_applications.inc();
    }

    pub fn inc_cleanups(&self, severity: CleanupSeverity) {
        self.inner()
            .cleanups
            .with_label_values(&[severity.as_str()])
            .inc();
    }

    pub fn observe_evaluation_latency(&self, duration_secs: f64) {
        self.inner().evaluation_latency_seconds.observe(duration_secs);
    }

    /// Every metric family in the default registry
    pub fn gather(&self) -> Vec<prometheus::proto::MetricFamily> {
        let _ = self.inner();
        prometheus::gather()
    }
}

/// Structured logger for governor events
///
/// Every event carries the device name and a stable `event` field so log
/// pipelines can filter on it.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    device_name: String,
}

impl StructuredLogger {
    pub fn new(device_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
        }
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn log_startup(&self, version: &str, target_frame_rate: f64) {
        info!(
            event = "governor_started",
            device = %self.device_name,
            governor_version = %version,
            target_frame_rate = target_frame_rate,
            "Performance governor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "governor_shutdown",
            device = %self.device_name,
            reason = %reason,
            "Performance governor shutting down"
        );
    }

    pub fn log_level_change(&self, from: PerformanceLevel, to: PerformanceLevel, composite: f64) {
        if to == PerformanceLevel::Poor {
            warn!(
                event = "performance_level_changed",
                device = %self.device_name,
                from = %from,
                to = %to,
                composite_score = composite,
                "Performance degraded to poor"
            );
        } else {
            info!(
                event = "performance_level_changed",
                device = %self.device_name,
                from = %from,
                to = %to,
                composite_score = composite,
                "Performance level changed"
            );
        }
    }

    pub fn log_context_change(&self, from: ActivityContext, to: ActivityContext, dwell_secs: f64) {
        info!(
            event = "context_changed",
            device = %self.device_name,
            from = %from,
            to = %to,
            dwell_secs = dwell_secs,
            "Activity context changed"
        );
    }

    pub fn log_policy_applied(&self, directives: &OptimizationDirectiveSet, reason: PolicyReason) {
        info!(
            event = "policy_applied",
            device = %self.device_name,
            profile = %directives.profile,
            reason = reason.as_str(),
            optimizations = ?directives.active_optimizations(),
            "Optimization directives applied"
        );
    }

    pub fn log_frame_drop_escalation(&self, frame_time_ms: f64, dropped_frames: u64) {
        warn!(
            event = "frame_drop_escalation",
            device = %self.device_name,
            frame_time_ms = frame_time_ms,
            dropped_frames_total = dropped_frames,
            "Burst of dropped frames, re-evaluating policy"
        );
    }

    pub fn log_power_mode_change(&self, from: PowerMode, to: PowerMode, sync_interval_secs: u64) {
        info!(
            event = "power_mode_changed",
            device = %self.device_name,
            from = %from,
            to = %to,
            sync_interval_secs = sync_interval_secs,
            "Power mode changed"
        );
    }
}
