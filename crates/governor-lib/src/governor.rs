//! The governor state machine
//!
//! `Governor` owns every component and all mutable state. It is synchronous
//! and takes the current instant as an argument, so the same code runs inside
//! the tokio owner task (see [`crate::runtime`]) and in deterministic tests.

use crate::config::GovernorConfig;
use crate::context::ContextManager;
use crate::error::Result;
use crate::metrics::{MemoryProbe, MetricsCollector, SystemMemoryProbe};
use crate::models::{
    ActivityContext, ContextProfileEntry, MemoryPressureLevel, PerformanceLevel,
    PerformanceReport, PowerMode, ThermalState,
};
use crate::observability::{GovernorMetrics, StructuredLogger};
use crate::policy::{OptimizationDirectiveSet, PolicyDecision, PolicyEngine, PolicyInputs};
use crate::pressure::{CleanupReport, CleanupTrigger, PressureResponder};
use crate::power::PowerModeCoordinator;
use crate::scorer::{PerformanceScorer, ScoreBreakdown};
use crate::subscription::{GovernorNotification, SubscriberRegistry, Subscription};
use crate::subsystems::{Subsystems, TieredDataCache};
use anyhow::Context as _;
use std::time::Instant;
use tracing::debug;

pub struct Governor {
    config: GovernorConfig,
    collector: MetricsCollector,
    scorer: PerformanceScorer,
    context: ContextManager,
    policy: PolicyEngine,
    pressure: PressureResponder,
    power: PowerModeCoordinator,
    subsystems: Subsystems,
    probe: Box<dyn MemoryProbe>,
    breakdown: ScoreBreakdown,
    last_evaluation: Option<Instant>,
    /// Ticks left to skip before the next monitoring cycle
    pending_skips: u32,
    monitoring: bool,
    subscribers: SubscriberRegistry,
    telemetry: GovernorMetrics,
    logger: StructuredLogger,
}

impl Governor {
    pub fn new(
        config: GovernorConfig,
        subsystems: Subsystems,
        probe: Box<dyn MemoryProbe>,
        logger: StructuredLogger,
        now: Instant,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            collector: MetricsCollector::new(&config),
            scorer: PerformanceScorer::new(config.target_frame_interval()),
            context: ContextManager::new(now),
            policy: PolicyEngine::new(config.policy.clone()),
            pressure: PressureResponder::new(config.pressure.clone(), now),
            power: PowerModeCoordinator::new(
                config.power.clone(),
                config.policy.low_battery_level,
            ),
            subsystems,
            probe,
            breakdown: ScoreBreakdown::default(),
            last_evaluation: None,
            pending_skips: 0,
            monitoring: false,
            subscribers: SubscriberRegistry::new(),
            telemetry: GovernorMetrics::new(),
            logger,
            config,
        })
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    pub fn level(&self) -> PerformanceLevel {
        self.breakdown.level
    }

    pub fn breakdown(&self) -> &ScoreBreakdown {
        &self.breakdown
    }

    /// When the policy was last evaluated
    pub fn last_evaluation(&self) -> Option<Instant> {
        self.last_evaluation
    }

    pub fn activity_context(&self) -> ActivityContext {
        self.context.current()
    }

    pub fn power_mode(&self) -> PowerMode {
        self.power.mode()
    }

    pub fn is_acute(&self) -> bool {
        self.pressure.is_acute()
    }

    pub fn active_directives(&self) -> Option<&OptimizationDirectiveSet> {
        self.policy.active()
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }

    pub fn subscribers(&self) -> SubscriberRegistry {
        self.subscribers.clone()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&GovernorNotification) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// Begin sampling. Pushes the current sync interval and applies an
    /// initial directive set unconditionally.
    pub fn start(&mut self, now: Instant) {
        if self.monitoring {
            return;
        }
        self.monitoring = true;
        self.pending_skips = 0;
        self.collector.reset();
        self.subsystems
            .background
            .set_sync_interval(self.power.sync_interval());
        self.telemetry.set_power_mode(self.power.mode());
        self.telemetry.set_battery_level(self.power.battery_level());
        self.policy.invalidate();
        self.reevaluate(now);
    }

    /// Stop sampling; later frame ticks and periodic cycles are ignored
    pub fn stop(&mut self) {
        self.monitoring = false;
    }

    /// Display refresh callback
    pub fn on_display_refresh(&mut self, now: Instant) {
        if !self.monitoring {
            return;
        }
        let Some(sample) = self.collector.record_frame(now) else {
            return;
        };

        if sample.dropped {
            self.telemetry.inc_dropped_frames();
        }
        if sample.escalate {
            self.telemetry.inc_frame_drop_escalations();
            self.logger.log_frame_drop_escalation(
                sample.elapsed.as_secs_f64() * 1000.0,
                self.collector.frames().dropped_frames(),
            );
            self.reevaluate(now);
        }
    }

    /// Periodic monitoring cycle: sample memory, feed the pressure
    /// responder, run any due routine cleanup, then re-score and re-evaluate.
    ///
    /// Power-saving modes stretch the cycle by the coordinator's monitoring
    /// multiplier; skipped ticks only check for a due routine cleanup.
    pub fn tick(&mut self, now: Instant) {
        if !self.monitoring {
            return;
        }

        if self.pending_skips > 0 {
            self.pending_skips -= 1;
            if self.pressure.routine_due(now) {
                self.run_routine_cleanup(now);
            }
            return;
        }
        self.pending_skips = self.power.monitoring_multiplier().saturating_sub(1);

        let usage = self.collector.sample_memory(self.probe.as_mut());
        let pressure = usage.used_percentage();
        self.telemetry.set_memory_used_ratio(pressure);
        self.telemetry.set_frame_rate(self.collector.frames().frame_rate());

        let outcome = self
            .pressure
            .observe_memory(pressure, &mut self.subsystems, now);
        if outcome.recovered {
            self.telemetry.set_emergency_active(false);
            self.subscribers
                .publish(&GovernorNotification::EmergencyCleared);
        }
        if let Some(report) = outcome.cleanup {
            self.record_cleanup(report);
        } else if self.pressure.routine_due(now) {
            self.run_routine_cleanup(now);
        }

        self.reevaluate(now);

        if !self.subscribers.is_empty() {
            let report = self.report(now);
            self.subscribers
                .publish(&GovernorNotification::Report(Box::new(report)));
        }
    }

    /// Thermal transitions re-score immediately
    pub fn on_thermal_changed(&mut self, state: ThermalState, now: Instant) {
        let changed = self.collector.record_thermal(state);
        self.telemetry.set_thermal_state(state);
        if changed {
            debug!(thermal = %state, "Thermal state changed");
        }
        self.reevaluate(now);
    }

    pub fn on_memory_pressure(&mut self, level: MemoryPressureLevel, now: Instant) {
        let report = self
            .pressure
            .on_pressure_notification(level, &mut self.subsystems, now);
        if let Some(report) = report {
            self.record_cleanup(report);
            self.reevaluate(now);
        }
    }

    /// OS low-memory warning: emergency cleanup completes before this returns
    pub fn on_low_memory_warning(&mut self, now: Instant) -> CleanupReport {
        let report =
            self.pressure
                .emergency_cleanup(CleanupTrigger::LowMemoryWarning, &mut self.subsystems, now);
        self.record_cleanup(report);
        self.reevaluate(now);
        report
    }

    pub fn on_power_mode_changed(&mut self, mode: PowerMode, now: Instant) {
        let previous = self.power.mode();
        if !self
            .power
            .set_mode(mode, self.subsystems.background.as_mut())
        {
            return;
        }

        self.telemetry.set_power_mode(mode);
        // A shorter cadence takes effect without waiting out the old one
        self.pending_skips = self
            .pending_skips
            .min(self.power.monitoring_multiplier().saturating_sub(1));
        self.logger
            .log_power_mode_change(previous, mode, self.power.sync_interval().as_secs());
        self.subscribers
            .publish(&GovernorNotification::PowerModeChanged {
                from: previous,
                to: mode,
            });
        self.reevaluate(now);
    }

    /// Battery level as a fraction in `[0, 1]`
    pub fn on_battery_level_changed(&mut self, level: f32, now: Instant) {
        if self.power.set_battery_level(level) {
            self.telemetry.set_battery_level(self.power.battery_level());
            self.reevaluate(now);
        }
    }

    /// Host-driven context switch. Returns false when the context is unchanged,
    /// in which case nothing is re-applied.
    pub fn set_activity_context(&mut self, next: ActivityContext, now: Instant) -> bool {
        let Some(transition) = self.context.set_context(next, now) else {
            return false;
        };

        self.logger
            .log_context_change(transition.from, transition.to, transition.dwell.as_secs_f64());
        self.subscribers
            .publish(&GovernorNotification::ContextChanged {
                from: transition.from,
                to: transition.to,
            });

        // The context routine is the new context's directive set
        self.reevaluate(now);
        true
    }

    pub fn run_routine_cleanup(&mut self, now: Instant) -> CleanupReport {
        let report = self
            .pressure
            .routine_cleanup(CleanupTrigger::Periodic, &mut self.subsystems, now);
        self.record_cleanup(report);
        report
    }

    /// Snapshot of current state
    pub fn report(&self, now: Instant) -> PerformanceReport {
        let frames = self.collector.frames();
        let memory = self.collector.memory().latest();
        let thermal = self.collector.thermal();

        let mut context_profile = self.context.profile();
        // Include time spent in the active context so far
        let current = self.context.current();
        let dwell = self.context.current_dwell(now).as_secs_f64();
        match context_profile.iter_mut().find(|e| e.context == current) {
            Some(entry) => entry.total_secs += dwell,
            None => context_profile.push(ContextProfileEntry {
                context: current,
                total_secs: dwell,
                visits: 0,
            }),
        }

        PerformanceReport {
            generated_at: chrono::Utc::now().timestamp(),
            monitoring: self.monitoring,
            frame_rate: frames.frame_rate(),
            average_frame_time_ms: frames.average_frame_time().unwrap_or(0.0) * 1000.0,
            dropped_frame_percentage: frames.dropped_frame_percentage(),
            memory,
            memory_used_percentage: memory.used_percentage(),
            thermal_state: thermal.current(),
            thermal_trend: thermal.trend(),
            composite_score: self.breakdown.composite,
            performance_level: self.breakdown.level,
            activity_context: current,
            power_mode: self.power.mode(),
            battery_level: self.power.battery_level(),
            sync_interval_secs: self.power.sync_interval().as_secs(),
            emergency_active: self.pressure.is_acute(),
            active_optimizations: self
                .policy
                .active()
                .map(OptimizationDirectiveSet::active_optimizations)
                .unwrap_or_default(),
            context_profile,
        }
    }

    /// Re-score and push the resulting directive set.
    ///
    /// Subsystems are only called when the set differs from the last one.
    fn reevaluate(&mut self, now: Instant) -> PolicyDecision {
        let started = Instant::now();
        self.last_evaluation = Some(now);

        let inputs = self.collector.score_inputs();
        let breakdown = self.scorer.score(&inputs);
        let previous = self.breakdown.level;
        self.breakdown = breakdown;
        self.telemetry.set_score(breakdown.composite, breakdown.level);

        if breakdown.level != previous {
            self.logger
                .log_level_change(previous, breakdown.level, breakdown.composite);
            self.subscribers
                .publish(&GovernorNotification::LevelChanged {
                    from: previous,
                    to: breakdown.level,
                    composite_score: breakdown.composite,
                });
        }

        let decision = self.policy.evaluate(&PolicyInputs {
            level: breakdown.level,
            context: self.context.current(),
            power_mode: self.power.mode(),
            memory_pressure: inputs.memory_used_fraction,
            thermal: inputs.thermal,
            battery_level: self.power.battery_level(),
            acute_pressure: self.pressure.is_acute(),
        });

        if self.policy.apply(&decision.directives, &mut self.subsystems) {
            self.telemetry.inc_policy_applications();
            self.logger
                .log_policy_applied(&decision.directives, decision.reason);
            self.subscribers
                .publish(&GovernorNotification::DirectivesApplied {
                    directives: decision.directives,
                    reason: decision.reason,
                });
        }

        self.telemetry
            .observe_evaluation_latency(started.elapsed().as_secs_f64());
        decision
    }

    fn record_cleanup(&mut self, report: CleanupReport) {
        self.telemetry.inc_cleanups(report.severity);
        self.telemetry.set_emergency_active(self.pressure.is_acute());
        self.subscribers
            .publish(&GovernorNotification::Cleanup(report));
    }
}

/// Assembles a [`Governor`] from optional parts
#[derive(Default)]
pub struct GovernorBuilder {
    config: Option<GovernorConfig>,
    subsystems: Option<Subsystems>,
    probe: Option<Box<dyn MemoryProbe>>,
    device_name: Option<String>,
}

impl GovernorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: GovernorConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn subsystems(mut self, subsystems: Subsystems) -> Self {
        self.subsystems = Some(subsystems);
        self
    }

    /// Use logging collaborators around the given cache
    pub fn logging_subsystems(self, cache: TieredDataCache) -> Self {
        self.subsystems(Subsystems::logging(cache))
    }

    pub fn memory_probe(mut self, probe: impl MemoryProbe + 'static) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = Some(name.into());
        self
    }

    /// Missing subsystems are an error; the probe defaults to the system probe
    pub fn build(self) -> anyhow::Result<Governor> {
        let subsystems = self
            .subsystems
            .ok_or_else(|| anyhow::anyhow!("subsystems are required"))?;
        let probe = self
            .probe
            .unwrap_or_else(|| Box::new(SystemMemoryProbe::new()));
        let logger = StructuredLogger::new(
            self.device_name
                .unwrap_or_else(|| "wearable".to_string()),
        );

        Governor::new(
            self.config.unwrap_or_default(),
            subsystems,
            probe,
            logger,
            Instant::now(),
        )
        .context("invalid governor configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FixedMemoryProbe;
    use crate::policy::{AnimationComplexity, CacheRegion, PolicyProfile, RenderFidelity};
    use crate::pressure::CleanupSeverity;
    use crate::subsystems::recording::{self, Recorder};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const GIB: u64 = 1024 * 1024 * 1024;

    struct Fixture {
        governor: Governor,
        recorder: Recorder,
        probe: FixedMemoryProbe,
        cache: TieredDataCache,
        start: Instant,
    }

    fn fixture() -> Fixture {
        let start = Instant::now();
        let cache = TieredDataCache::new();
        let (subsystems, recorder) = recording::subsystems(cache.clone());
        let probe = FixedMemoryProbe::new(GIB / 2, GIB);

        let governor = Governor::new(
            GovernorConfig::default(),
            subsystems,
            Box::new(probe.clone()),
            StructuredLogger::new("test-watch"),
            start,
        )
        .unwrap();

        Fixture {
            governor,
            recorder,
            probe,
            cache,
            start,
        }
    }

    /// Feed `frames` refresh ticks spaced at `interval`, returning the last instant
    fn drive_frames(governor: &mut Governor, from: Instant, interval: Duration, frames: u32) -> Instant {
        let mut now = from;
        for _ in 0..=frames {
            governor.on_display_refresh(now);
            now += interval;
        }
        now
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = GovernorConfig::default();
        config.power.extreme_secs = 10;

        let (subsystems, _) = recording::subsystems(TieredDataCache::new());
        let result = Governor::new(
            config,
            subsystems,
            Box::new(FixedMemoryProbe::new(0, GIB)),
            StructuredLogger::new("test-watch"),
            Instant::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_start_applies_initial_directives() {
        let mut f = fixture();
        f.governor.start(f.start);

        assert!(f.governor.is_monitoring());
        assert_eq!(f.recorder.log().applications(), 1);
        assert_eq!(f.recorder.log().sync_intervals, vec![Duration::from_secs(60)]);
        assert_eq!(
            f.governor.active_directives().unwrap().profile,
            PolicyProfile::Normal
        );
    }

    #[test]
    fn test_healthy_device_scores_optimal() {
        let mut f = fixture();
        f.governor.start(f.start);

        let interval = f.governor.config().target_frame_interval();
        let now = drive_frames(&mut f.governor, f.start, interval, 120);
        f.governor.tick(now);

        let breakdown = *f.governor.breakdown();
        assert!((breakdown.frame_rate_score - 1.0).abs() < 1e-3);
        assert!((breakdown.memory_score - 0.5).abs() < 1e-9);
        assert_eq!(breakdown.thermal_score, 1.0);
        assert!((breakdown.composite - 0.8333).abs() < 1e-3);
        assert_eq!(breakdown.level, PerformanceLevel::Optimal);

        let report = f.governor.report(now);
        assert_eq!(report.performance_level, PerformanceLevel::Optimal);
        assert!((report.frame_rate - 60.0).abs() < 0.1);
        assert_eq!(report.dropped_frame_percentage, 0.0);
        assert!(!report.emergency_active);
    }

    #[test]
    fn test_thermal_critical_forces_aggressive() {
        let mut f = fixture();
        f.governor.start(f.start);

        let interval = f.governor.config().target_frame_interval();
        let now = drive_frames(&mut f.governor, f.start, interval, 60);
        f.governor.tick(now);
        f.governor.on_thermal_changed(ThermalState::Critical, now);
        assert_eq!(f.governor.last_evaluation(), Some(now));

        let breakdown = f.governor.breakdown();
        assert_eq!(breakdown.thermal_score, 0.0);
        assert!((breakdown.composite - 0.5).abs() < 1e-3);
        assert_eq!(breakdown.level, PerformanceLevel::Fair);

        let active = f.governor.active_directives().unwrap();
        assert_eq!(active.profile, PolicyProfile::Aggressive);

        let log = f.recorder.log();
        let last = log.animation.last().unwrap();
        assert_eq!(last.complexity, AnimationComplexity::Disabled);
        assert_eq!(log.rendering.last().unwrap().fidelity, RenderFidelity::Low);
    }

    #[test]
    fn test_context_switch_is_idempotent() {
        let mut f = fixture();
        f.governor.start(f.start);
        let now = f.start + Duration::from_secs(5);

        assert!(f
            .governor
            .set_activity_context(ActivityContext::Navigation, now));
        let applied = f.recorder.log().applications();
        assert_eq!(applied, 2);

        assert!(!f
            .governor
            .set_activity_context(ActivityContext::Navigation, now + Duration::from_secs(1)));
        assert_eq!(f.recorder.log().applications(), applied);

        // Navigation preloads map tiles into the cache
        assert!(f.cache.contains("preload:map_tiles"));
        let active = f.governor.active_directives().unwrap();
        assert_eq!(active.cache.preload, Some(CacheRegion::MapTiles));
        assert!(active.rendering.map_shortcuts);
    }

    #[test]
    fn test_context_profile_includes_current_dwell() {
        let mut f = fixture();
        f.governor
            .set_activity_context(ActivityContext::Scorecard, f.start + Duration::from_secs(10));

        let report = f.governor.report(f.start + Duration::from_secs(25));
        let idle = report
            .context_profile
            .iter()
            .find(|e| e.context == ActivityContext::Idle)
            .unwrap();
        let scorecard = report
            .context_profile
            .iter()
            .find(|e| e.context == ActivityContext::Scorecard)
            .unwrap();

        assert!((idle.total_secs - 10.0).abs() < 1e-6);
        assert_eq!(idle.visits, 1);
        assert!((scorecard.total_secs - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_low_memory_warning_runs_emergency_and_holds_aggressive() {
        let mut f = fixture();
        f.cache.insert("course:1", 1024, true);
        f.cache.insert("tile:3:4", 4096, false);
        f.governor.start(f.start);

        let report = f.governor.on_low_memory_warning(f.start);
        assert_eq!(report.severity, CleanupSeverity::Emergency);
        assert!(f.cache.is_empty());
        assert!(f.governor.is_acute());
        assert_eq!(
            f.governor.active_directives().unwrap().profile,
            PolicyProfile::Aggressive
        );
        assert_eq!(f.recorder.log().suspensions, 1);
    }

    #[test]
    fn test_recovery_restores_context_defaults() {
        let mut f = fixture();
        f.probe.set_fraction(0.3);
        f.governor.start(f.start);
        f.governor.on_low_memory_warning(f.start);

        let mut now = f.start;
        for _ in 0..3 {
            now += Duration::from_secs(1);
            f.governor.tick(now);
        }

        assert!(!f.governor.is_acute());
        assert_eq!(f.recorder.log().resumes, 1);
        assert_eq!(
            f.governor.active_directives().unwrap().profile,
            PolicyProfile::Normal
        );
    }

    #[test]
    fn test_memory_pressure_notification_levels() {
        let mut f = fixture();
        f.cache.insert("course:1", 1024, true);
        f.cache.insert("tile:3:4", 4096, false);
        f.governor.start(f.start);

        f.governor
            .on_memory_pressure(MemoryPressureLevel::Warning, f.start);
        assert!(f.cache.contains("course:1"));
        assert!(!f.cache.contains("tile:3:4"));
        assert!(!f.governor.is_acute());

        f.governor
            .on_memory_pressure(MemoryPressureLevel::Critical, f.start);
        assert!(f.cache.is_empty());
        assert!(f.governor.is_acute());
    }

    #[test]
    fn test_routine_cleanup_runs_on_interval() {
        let mut f = fixture();
        f.governor.start(f.start);

        f.governor.tick(f.start + Duration::from_secs(10));
        assert_eq!(f.recorder.log().compactions, 0);

        f.governor.tick(f.start + Duration::from_secs(30));
        assert_eq!(f.recorder.log().compactions, 1);

        f.governor.tick(f.start + Duration::from_secs(31));
        assert_eq!(f.recorder.log().compactions, 1);
    }

    #[test]
    fn test_power_mode_change_reapplies_and_sets_interval() {
        let mut f = fixture();
        f.governor.start(f.start);

        f.governor
            .on_power_mode_changed(PowerMode::Extreme, f.start);
        let log = f.recorder.log();
        assert_eq!(log.sync_intervals.last(), Some(&Duration::from_secs(600)));
        assert_eq!(
            f.governor.active_directives().unwrap().profile,
            PolicyProfile::Aggressive
        );

        let report = f.governor.report(f.start);
        assert_eq!(report.power_mode, PowerMode::Extreme);
        assert_eq!(report.sync_interval_secs, 600);
    }

    #[test]
    fn test_extreme_mode_samples_memory_less_often() {
        let mut normal = fixture();
        normal.governor.start(normal.start);
        for secs in 1..=10 {
            normal.governor.tick(normal.start + Duration::from_secs(secs));
        }
        assert_eq!(normal.governor.collector().memory().history().len(), 10);

        let mut f = fixture();
        f.governor.start(f.start);
        f.governor
            .on_power_mode_changed(PowerMode::Extreme, f.start);
        for secs in 1..=10 {
            f.governor.tick(f.start + Duration::from_secs(secs));
        }
        assert_eq!(f.governor.collector().memory().history().len(), 1);

        f.governor.tick(f.start + Duration::from_secs(11));
        assert_eq!(f.governor.collector().memory().history().len(), 2);

        // Back to normal resumes sampling on the next tick
        f.governor
            .on_power_mode_changed(PowerMode::Normal, f.start + Duration::from_secs(11));
        f.governor.tick(f.start + Duration::from_secs(12));
        assert_eq!(f.governor.collector().memory().history().len(), 3);
    }

    #[test]
    fn test_skipped_ticks_still_run_routine_cleanup() {
        let mut f = fixture();
        f.governor.start(f.start);
        f.governor
            .on_power_mode_changed(PowerMode::Extreme, f.start);

        f.governor.tick(f.start + Duration::from_secs(1));
        f.governor.tick(f.start + Duration::from_secs(30));

        assert_eq!(f.governor.collector().memory().history().len(), 1);
        assert_eq!(f.recorder.log().compactions, 1);
    }

    #[test]
    fn test_low_battery_selects_moderate() {
        let mut f = fixture();
        f.governor.start(f.start);

        f.governor.on_battery_level_changed(0.2, f.start);
        assert_eq!(
            f.governor.active_directives().unwrap().profile,
            PolicyProfile::Moderate
        );
    }

    #[test]
    fn test_frame_drop_burst_escalates() {
        let mut f = fixture();
        f.governor.start(f.start);

        // 50 ms frames are dropped at a 60 Hz target; the sixth inside 1 s escalates
        let now = drive_frames(&mut f.governor, f.start, Duration::from_millis(50), 8);
        let frames = f.governor.collector().frames();
        assert_eq!(frames.escalations(), 1);
        // Frame score 1/3 with idle memory and nominal thermal
        assert_eq!(f.governor.level(), PerformanceLevel::Good);

        let report = f.governor.report(now);
        assert_eq!(report.dropped_frame_percentage, 100.0);
    }

    #[test]
    fn test_samples_dropped_when_not_monitoring() {
        let mut f = fixture();
        let interval = f.governor.config().target_frame_interval();
        drive_frames(&mut f.governor, f.start, interval, 10);
        f.governor.tick(f.start + Duration::from_secs(1));

        assert_eq!(f.governor.collector().frames().total_frames(), 0);
        assert!(f.governor.collector().memory().history().is_empty());

        f.governor.start(f.start);
        f.governor.stop();
        drive_frames(&mut f.governor, f.start, interval, 10);
        assert_eq!(f.governor.collector().frames().total_frames(), 0);
    }

    #[test]
    fn test_subscribers_receive_notifications() {
        let mut f = fixture();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let subscription = f
            .governor
            .subscribe(move |n| sink.lock().unwrap().push(n.clone()));

        f.governor.start(f.start);
        f.governor
            .set_activity_context(ActivityContext::Sync, f.start);
        f.governor.tick(f.start + Duration::from_secs(1));

        {
            let received = received.lock().unwrap();
            assert!(received
                .iter()
                .any(|n| matches!(n, GovernorNotification::ContextChanged { .. })));
            assert!(received
                .iter()
                .any(|n| matches!(n, GovernorNotification::DirectivesApplied { .. })));
            assert!(received
                .iter()
                .any(|n| matches!(n, GovernorNotification::Report(_))));
        }

        drop(subscription);
        let before = received.lock().unwrap().len();
        f.governor.tick(f.start + Duration::from_secs(2));
        assert_eq!(received.lock().unwrap().len(), before);
    }

    #[test]
    fn test_builder_requires_subsystems() {
        let result = GovernorBuilder::new()
            .memory_probe(FixedMemoryProbe::new(0, GIB))
            .build();
        assert!(result.is_err());

        let governor = GovernorBuilder::new()
            .logging_subsystems(TieredDataCache::new())
            .memory_probe(FixedMemoryProbe::new(0, GIB))
            .device_name("watch-07")
            .build()
            .unwrap();
        assert_eq!(governor.activity_context(), ActivityContext::Idle);
    }
}
