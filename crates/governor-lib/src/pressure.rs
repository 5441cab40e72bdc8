//! Memory pressure response
//!
//! Two tiers of cleanup:
//! - routine: evict non-essential cache entries, release completed animation
//!   state and compact object pools. Runs on a fixed interval, on sustained
//!   high memory pressure, or on a `warning` pressure notification.
//! - emergency: routine work plus suspending non-critical background services
//!   and clearing every cache. Runs on an OS low-memory warning or a
//!   `critical` pressure notification, and keeps the acute flag raised until
//!   pressure recovers.

use crate::config::PressureConfig;
use crate::models::MemoryPressureLevel;
use crate::subsystems::Subsystems;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupSeverity {
    Routine,
    Emergency,
}

impl CleanupSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            CleanupSeverity::Routine => "routine",
            CleanupSeverity::Emergency => "emergency",
        }
    }
}

/// What caused a cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupTrigger {
    Periodic,
    SustainedPressure,
    PressureWarning,
    PressureCritical,
    LowMemoryWarning,
}

impl CleanupTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            CleanupTrigger::Periodic => "periodic",
            CleanupTrigger::SustainedPressure => "sustained_pressure",
            CleanupTrigger::PressureWarning => "pressure_warning",
            CleanupTrigger::PressureCritical => "pressure_critical",
            CleanupTrigger::LowMemoryWarning => "low_memory_warning",
        }
    }
}

/// Work done by one cleanup pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub severity: CleanupSeverity,
    pub trigger: CleanupTrigger,
    pub evicted_entries: usize,
    pub released_animations: usize,
    pub compacted_objects: usize,
    pub suspended_services: usize,
}

/// Result of feeding one memory sample to the responder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PressureOutcome {
    pub cleanup: Option<CleanupReport>,
    /// Emergency mode ended on this sample
    pub recovered: bool,
}

pub struct PressureResponder {
    config: PressureConfig,
    emergency_active: bool,
    /// Consecutive samples above the sustained threshold
    high_streak: u32,
    /// Consecutive samples below the recovery threshold while in emergency
    recovery_streak: u32,
    last_routine: Instant,
    routine_runs: u64,
    emergency_runs: u64,
}

impl PressureResponder {
    pub fn new(config: PressureConfig, now: Instant) -> Self {
        Self {
            config,
            emergency_active: false,
            high_streak: 0,
            recovery_streak: 0,
            last_routine: now,
            routine_runs: 0,
            emergency_runs: 0,
        }
    }

    /// True while emergency mode holds the policy at its most restrictive
    pub fn is_acute(&self) -> bool {
        self.emergency_active
    }

    pub fn routine_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_routine) >= self.config.routine_interval()
    }

    pub fn routine_runs(&self) -> u64 {
        self.routine_runs
    }

    pub fn emergency_runs(&self) -> u64 {
        self.emergency_runs
    }

    pub fn routine_cleanup(
        &mut self,
        trigger: CleanupTrigger,
        subsystems: &mut Subsystems,
        now: Instant,
    ) -> CleanupReport {
        let report = Self::release_non_essential(trigger, subsystems);
        self.last_routine = now;
        self.routine_runs += 1;

        info!(
            event = "routine_cleanup",
            trigger = trigger.as_str(),
            evicted_entries = report.evicted_entries,
            released_animations = report.released_animations,
            compacted_objects = report.compacted_objects,
            "Routine cleanup completed"
        );
        report
    }

    /// Runs synchronously; every cache entry is gone when this returns
    pub fn emergency_cleanup(
        &mut self,
        trigger: CleanupTrigger,
        subsystems: &mut Subsystems,
        now: Instant,
    ) -> CleanupReport {
        let mut report = Self::release_non_essential(trigger, subsystems);
        report.severity = CleanupSeverity::Emergency;
        report.suspended_services = subsystems.background.suspend_non_critical();
        report.evicted_entries += subsystems.cache.clear_all();

        self.emergency_active = true;
        self.recovery_streak = 0;
        self.high_streak = 0;
        self.last_routine = now;
        self.emergency_runs += 1;

        warn!(
            event = "emergency_cleanup",
            trigger = trigger.as_str(),
            evicted_entries = report.evicted_entries,
            released_animations = report.released_animations,
            compacted_objects = report.compacted_objects,
            suspended_services = report.suspended_services,
            "Emergency cleanup completed"
        );
        report
    }

    /// Handle an OS memory-pressure notification
    pub fn on_pressure_notification(
        &mut self,
        level: MemoryPressureLevel,
        subsystems: &mut Subsystems,
        now: Instant,
    ) -> Option<CleanupReport> {
        match level {
            MemoryPressureLevel::Normal => None,
            MemoryPressureLevel::Warning => {
                Some(self.routine_cleanup(CleanupTrigger::PressureWarning, subsystems, now))
            }
            MemoryPressureLevel::Critical => {
                Some(self.emergency_cleanup(CleanupTrigger::PressureCritical, subsystems, now))
            }
        }
    }

    /// Feed the latest memory pressure sample
    pub fn observe_memory(
        &mut self,
        pressure: f64,
        subsystems: &mut Subsystems,
        now: Instant,
    ) -> PressureOutcome {
        let mut outcome = PressureOutcome::default();

        if pressure > self.config.sustained_threshold {
            self.high_streak += 1;
        } else {
            self.high_streak = 0;
        }

        if self.emergency_active {
            if pressure < self.config.recovery_threshold {
                self.recovery_streak += 1;
            } else {
                self.recovery_streak = 0;
            }

            if self.recovery_streak >= self.config.recovery_samples.max(1) {
                self.emergency_active = false;
                self.recovery_streak = 0;
                subsystems.background.resume();
                outcome.recovered = true;
                info!(
                    event = "emergency_cleared",
                    pressure = pressure,
                    "Memory pressure recovered, leaving emergency mode"
                );
            }
        }

        if self.high_streak >= self.config.sustained_samples.max(1) {
            self.high_streak = 0;
            outcome.cleanup =
                Some(self.routine_cleanup(CleanupTrigger::SustainedPressure, subsystems, now));
        }

        outcome
    }

    fn release_non_essential(trigger: CleanupTrigger, subsystems: &mut Subsystems) -> CleanupReport {
        CleanupReport {
            severity: CleanupSeverity::Routine,
            trigger,
            evicted_entries: subsystems.cache.evict_non_essential(),
            released_animations: subsystems.animation.release_completed(),
            compacted_objects: subsystems.view.compact_pools(),
            suspended_services: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystems::{recording, TieredDataCache};
    use std::time::Duration;

    fn cache_with_mixed_entries() -> TieredDataCache {
        let cache = TieredDataCache::new();
        cache.insert("course:42", 4096, true);
        cache.insert("player:profile", 1024, true);
        cache.insert("tile:7:9", 8192, false);
        cache.insert("weather:today", 512, false);
        cache
    }

    fn responder(now: Instant) -> PressureResponder {
        PressureResponder::new(PressureConfig::default(), now)
    }

    #[test]
    fn test_routine_cleanup_is_selective() {
        let now = Instant::now();
        let cache = cache_with_mixed_entries();
        let (mut subsystems, recorder) = recording::subsystems(cache.clone());
        let mut responder = responder(now);

        let report = responder.routine_cleanup(CleanupTrigger::Periodic, &mut subsystems, now);

        assert_eq!(report.severity, CleanupSeverity::Routine);
        assert_eq!(report.evicted_entries, 2);
        assert!(cache.contains("course:42"));
        assert!(cache.contains("player:profile"));
        assert!(!cache.contains("tile:7:9"));
        assert!(!responder.is_acute());

        let log = recorder.log();
        assert_eq!(log.released_animations, 1);
        assert_eq!(log.compactions, 1);
        assert_eq!(log.suspensions, 0);
    }

    #[test]
    fn test_emergency_cleanup_clears_everything() {
        let now = Instant::now();
        let cache = cache_with_mixed_entries();
        let (mut subsystems, recorder) = recording::subsystems(cache.clone());
        let mut responder = responder(now);

        let report =
            responder.emergency_cleanup(CleanupTrigger::LowMemoryWarning, &mut subsystems, now);

        assert_eq!(report.severity, CleanupSeverity::Emergency);
        assert_eq!(report.evicted_entries, 4);
        assert_eq!(report.suspended_services, 1);
        assert!(cache.is_empty());
        assert!(responder.is_acute());

        let log = recorder.log();
        assert_eq!(log.released_animations, 1);
        assert_eq!(log.compactions, 1);
        assert_eq!(log.suspensions, 1);
    }

    #[test]
    fn test_emergency_on_essential_only_cache() {
        let now = Instant::now();
        let cache = TieredDataCache::new();
        cache.insert("course:42", 4096, true);
        let (mut subsystems, _recorder) = recording::subsystems(cache.clone());
        let mut responder = responder(now);

        let routine = responder.routine_cleanup(CleanupTrigger::Periodic, &mut subsystems, now);
        assert_eq!(routine.evicted_entries, 0);
        assert_eq!(cache.len(), 1);

        responder.emergency_cleanup(CleanupTrigger::LowMemoryWarning, &mut subsystems, now);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_pressure_notification_levels() {
        let now = Instant::now();
        let (mut subsystems, _recorder) = recording::subsystems(cache_with_mixed_entries());
        let mut responder = responder(now);

        assert!(responder
            .on_pressure_notification(MemoryPressureLevel::Normal, &mut subsystems, now)
            .is_none());

        let warning = responder
            .on_pressure_notification(MemoryPressureLevel::Warning, &mut subsystems, now)
            .unwrap();
        assert_eq!(warning.severity, CleanupSeverity::Routine);
        assert_eq!(warning.trigger, CleanupTrigger::PressureWarning);

        let critical = responder
            .on_pressure_notification(MemoryPressureLevel::Critical, &mut subsystems, now)
            .unwrap();
        assert_eq!(critical.severity, CleanupSeverity::Emergency);
        assert!(responder.is_acute());
    }

    #[test]
    fn test_sustained_pressure_triggers_routine_cleanup() {
        let now = Instant::now();
        let (mut subsystems, _recorder) = recording::subsystems(cache_with_mixed_entries());
        let mut responder = responder(now);

        assert!(responder.observe_memory(0.85, &mut subsystems, now).cleanup.is_none());
        assert!(responder.observe_memory(0.9, &mut subsystems, now).cleanup.is_none());
        let outcome = responder.observe_memory(0.82, &mut subsystems, now);

        let report = outcome.cleanup.unwrap();
        assert_eq!(report.trigger, CleanupTrigger::SustainedPressure);
        assert_eq!(responder.routine_runs(), 1);
    }

    #[test]
    fn test_interrupted_pressure_does_not_trigger() {
        let now = Instant::now();
        let (mut subsystems, _recorder) = recording::subsystems(TieredDataCache::new());
        let mut responder = responder(now);

        responder.observe_memory(0.85, &mut subsystems, now);
        responder.observe_memory(0.85, &mut subsystems, now);
        responder.observe_memory(0.8, &mut subsystems, now);
        let outcome = responder.observe_memory(0.85, &mut subsystems, now);

        assert!(outcome.cleanup.is_none());
        assert_eq!(responder.routine_runs(), 0);
    }

    #[test]
    fn test_recovery_resumes_background_services() {
        let now = Instant::now();
        let (mut subsystems, recorder) = recording::subsystems(TieredDataCache::new());
        let mut responder = responder(now);

        responder.emergency_cleanup(CleanupTrigger::LowMemoryWarning, &mut subsystems, now);

        assert!(!responder.observe_memory(0.5, &mut subsystems, now).recovered);
        // A sample at the threshold breaks the streak
        assert!(!responder.observe_memory(0.6, &mut subsystems, now).recovered);
        assert!(!responder.observe_memory(0.5, &mut subsystems, now).recovered);
        assert!(!responder.observe_memory(0.4, &mut subsystems, now).recovered);
        assert!(responder.is_acute());

        let outcome = responder.observe_memory(0.3, &mut subsystems, now);
        assert!(outcome.recovered);
        assert!(!responder.is_acute());
        assert_eq!(recorder.log().resumes, 1);
    }

    #[test]
    fn test_routine_due_after_interval() {
        let start = Instant::now();
        let (mut subsystems, _recorder) = recording::subsystems(TieredDataCache::new());
        let mut responder = responder(start);

        assert!(!responder.routine_due(start + Duration::from_secs(29)));
        assert!(responder.routine_due(start + Duration::from_secs(30)));

        let later = start + Duration::from_secs(31);
        responder.routine_cleanup(CleanupTrigger::Periodic, &mut subsystems, later);
        assert!(!responder.routine_due(later + Duration::from_secs(10)));
    }
}
