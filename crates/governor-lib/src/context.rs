//! Activity context tracking
//!
//! The host application is the sole source of truth for what the user is
//! doing. Transitions are explicit; the manager never infers a context.

use crate::models::{ActivityContext, ContextProfileEntry};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A context change that actually happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextTransition {
    pub from: ActivityContext,
    pub to: ActivityContext,
    /// Time spent in `from`
    pub dwell: Duration,
}

#[derive(Debug, Clone, Copy, Default)]
struct ContextStats {
    total: Duration,
    visits: u32,
}

/// Tracks the active context and how long each one has been held
#[derive(Debug, Clone)]
pub struct ContextManager {
    current: ActivityContext,
    entered_at: Instant,
    profile: HashMap<ActivityContext, ContextStats>,
}

impl ContextManager {
    pub fn new(now: Instant) -> Self {
        Self {
            current: ActivityContext::default(),
            entered_at: now,
            profile: HashMap::new(),
        }
    }

    pub fn current(&self) -> ActivityContext {
        self.current
    }

    /// Switch context. Setting the current context again is a no-op.
    pub fn set_context(&mut self, next: ActivityContext, now: Instant) -> Option<ContextTransition> {
        if next == self.current {
            return None;
        }

        let dwell = now.saturating_duration_since(self.entered_at);
        let stats = self.profile.entry(self.current).or_default();
        stats.total += dwell;
        stats.visits += 1;

        let transition = ContextTransition {
            from: self.current,
            to: next,
            dwell,
        };

        self.current = next;
        self.entered_at = now;

        Some(transition)
    }

    /// Time spent in the active context so far
    pub fn current_dwell(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.entered_at)
    }

    /// Completed visits per context, in declaration order
    pub fn profile(&self) -> Vec<ContextProfileEntry> {
        ActivityContext::ALL
            .into_iter()
            .filter_map(|ctx| {
                self.profile.get(&ctx).map(|stats| ContextProfileEntry {
                    context: ctx,
                    total_secs: stats.total.as_secs_f64(),
                    visits: stats.visits,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        let manager = ContextManager::new(Instant::now());
        assert_eq!(manager.current(), ActivityContext::Idle);
        assert!(manager.profile().is_empty());
    }

    #[test]
    fn test_transition_records_previous_dwell() {
        let start = Instant::now();
        let mut manager = ContextManager::new(start);

        let transition = manager
            .set_context(ActivityContext::Navigation, start + Duration::from_secs(5))
            .unwrap();

        assert_eq!(transition.from, ActivityContext::Idle);
        assert_eq!(transition.to, ActivityContext::Navigation);
        assert_eq!(transition.dwell, Duration::from_secs(5));

        let profile = manager.profile();
        assert_eq!(profile.len(), 1);
        assert_eq!(profile[0].context, ActivityContext::Idle);
        assert_eq!(profile[0].visits, 1);
        assert!((profile[0].total_secs - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_context_is_idempotent() {
        let start = Instant::now();
        let mut manager = ContextManager::new(start);

        assert!(manager
            .set_context(ActivityContext::Scorecard, start + Duration::from_secs(1))
            .is_some());
        assert!(manager
            .set_context(ActivityContext::Scorecard, start + Duration::from_secs(2))
            .is_none());

        let profile = manager.profile();
        assert_eq!(profile.len(), 1);
        assert_eq!(profile[0].visits, 1);
        assert_eq!(manager.current_dwell(start + Duration::from_secs(3)), Duration::from_secs(2));
    }

    #[test]
    fn test_profile_accumulates_visits() {
        let start = Instant::now();
        let mut manager = ContextManager::new(start);

        manager.set_context(ActivityContext::Menu, start + Duration::from_secs(1));
        manager.set_context(ActivityContext::Idle, start + Duration::from_secs(3));
        manager.set_context(ActivityContext::Menu, start + Duration::from_secs(6));
        manager.set_context(ActivityContext::Sync, start + Duration::from_secs(10));

        let profile = manager.profile();
        let idle = profile.iter().find(|e| e.context == ActivityContext::Idle).unwrap();
        let menu = profile.iter().find(|e| e.context == ActivityContext::Menu).unwrap();

        assert_eq!(idle.visits, 2);
        assert!((idle.total_secs - 4.0).abs() < 1e-9);
        assert_eq!(menu.visits, 2);
        assert!((menu.total_secs - 6.0).abs() < 1e-9);
    }
}
