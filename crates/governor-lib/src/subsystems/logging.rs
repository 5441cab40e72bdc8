//! Collaborators that log directives instead of driving a UI toolkit

use super::{AnimationController, BackgroundServices, RenderingEngine, ViewRenderer};
use crate::policy::{AnimationDirective, RenderingDirective, ViewDirective};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct LoggingAnimationController {
    current: AnimationDirective,
    /// Finished animations whose state has not been released yet
    completed: usize,
}

impl LoggingAnimationController {
    pub fn current(&self) -> AnimationDirective {
        self.current
    }
}

impl AnimationController for LoggingAnimationController {
    fn apply(&mut self, directive: &AnimationDirective) {
        // Downgrading complexity finishes any in-flight animation
        if directive.complexity > self.current.complexity {
            self.completed += 1;
        }
        self.current = *directive;
        info!(
            complexity = ?directive.complexity,
            update_frequency = ?directive.update_frequency,
            "Animation directive applied"
        );
    }

    fn release_completed(&mut self) -> usize {
        std::mem::take(&mut self.completed)
    }
}

#[derive(Debug, Default)]
pub struct LoggingViewRenderer {
    current: ViewDirective,
    pooled_views: usize,
}

impl ViewRenderer for LoggingViewRenderer {
    fn apply(&mut self, directive: &ViewDirective) {
        if directive.mode != self.current.mode {
            // Views built for the old mode go back to the pool
            self.pooled_views += 4;
        }
        self.current = *directive;
        info!(
            mode = ?directive.mode,
            background_safe = directive.background_safe,
            "View directive applied"
        );
    }

    fn compact_pools(&mut self) -> usize {
        std::mem::take(&mut self.pooled_views)
    }
}

#[derive(Debug, Default)]
pub struct LoggingRenderingEngine {
    current: RenderingDirective,
}

impl RenderingEngine for LoggingRenderingEngine {
    fn apply(&mut self, directive: &RenderingDirective) {
        self.current = *directive;
        info!(
            fidelity = ?directive.fidelity,
            map_shortcuts = directive.map_shortcuts,
            "Rendering directive applied"
        );
    }
}

#[derive(Debug)]
pub struct LoggingBackgroundServices {
    suspended: bool,
    sync_interval: Duration,
}

impl Default for LoggingBackgroundServices {
    fn default() -> Self {
        Self {
            suspended: false,
            sync_interval: Duration::from_secs(60),
        }
    }
}

impl LoggingBackgroundServices {
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn sync_interval(&self) -> Duration {
        self.sync_interval
    }
}

impl BackgroundServices for LoggingBackgroundServices {
    fn suspend_non_critical(&mut self) -> usize {
        if self.suspended {
            return 0;
        }
        self.suspended = true;
        info!("Background sync suspended");
        1
    }

    fn resume(&mut self) {
        if self.suspended {
            self.suspended = false;
            info!("Background sync resumed");
        }
    }

    fn set_sync_interval(&mut self, interval: Duration) {
        self.sync_interval = interval;
        debug!(interval_secs = interval.as_secs(), "Sync interval updated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::AnimationComplexity;

    #[test]
    fn test_downgrade_produces_releasable_state() {
        let mut animation = LoggingAnimationController::default();
        animation.apply(&AnimationDirective {
            complexity: AnimationComplexity::Disabled,
            ..Default::default()
        });

        assert_eq!(animation.current().complexity, AnimationComplexity::Disabled);
        assert_eq!(animation.release_completed(), 1);
        assert_eq!(animation.release_completed(), 0);
    }

    #[test]
    fn test_background_suspend_is_idempotent() {
        let mut background = LoggingBackgroundServices::default();
        assert_eq!(background.suspend_non_critical(), 1);
        assert_eq!(background.suspend_non_critical(), 0);
        assert!(background.is_suspended());

        background.resume();
        assert!(!background.is_suspended());

        background.set_sync_interval(Duration::from_secs(300));
        assert_eq!(background.sync_interval(), Duration::from_secs(300));
    }
}
