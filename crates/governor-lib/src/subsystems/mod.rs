//! Downstream collaborators driven by the governor
//!
//! The governor never renders, animates or caches anything itself. It pushes
//! directive groups into these traits and asks them to release resources under
//! pressure. All calls are synchronous and must not block.

mod cache;
mod logging;

pub use cache::{CacheEntry, TieredDataCache};
pub use logging::{
    LoggingAnimationController, LoggingBackgroundServices, LoggingRenderingEngine,
    LoggingViewRenderer,
};

use crate::policy::{AnimationDirective, CacheDirective, RenderingDirective, ViewDirective};
use std::time::Duration;

/// Animation subsystem
pub trait AnimationController: Send {
    fn apply(&mut self, directive: &AnimationDirective);

    /// Drop state held for animations that already finished; returns the count released
    fn release_completed(&mut self) -> usize;
}

/// View layer
pub trait ViewRenderer: Send {
    fn apply(&mut self, directive: &ViewDirective);

    /// Shrink reusable view/object pools; returns the number of objects freed
    fn compact_pools(&mut self) -> usize;
}

/// Data cache
pub trait DataCache: Send {
    fn apply(&mut self, directive: &CacheDirective);

    /// Evict entries not flagged essential; returns the count evicted
    fn evict_non_essential(&mut self) -> usize;

    /// Evict everything; returns the count evicted
    fn clear_all(&mut self) -> usize;
}

/// Rendering engine
pub trait RenderingEngine: Send {
    fn apply(&mut self, directive: &RenderingDirective);
}

/// Background work such as data sync
pub trait BackgroundServices: Send {
    /// Pause services that are not needed for the current activity; returns the count paused
    fn suspend_non_critical(&mut self) -> usize;

    /// Resume anything paused by `suspend_non_critical`
    fn resume(&mut self);

    fn set_sync_interval(&mut self, interval: Duration);
}

/// The full set of collaborators owned by a governor
pub struct Subsystems {
    pub animation: Box<dyn AnimationController>,
    pub view: Box<dyn ViewRenderer>,
    pub cache: Box<dyn DataCache>,
    pub rendering: Box<dyn RenderingEngine>,
    pub background: Box<dyn BackgroundServices>,
}

impl Subsystems {
    /// Collaborators that only log directives, backed by a real tiered cache.
    ///
    /// Used by hosts without a UI toolkit, such as the standalone daemon.
    pub fn logging(cache: TieredDataCache) -> Self {
        Self {
            animation: Box::new(LoggingAnimationController::default()),
            view: Box::new(LoggingViewRenderer::default()),
            cache: Box::new(cache),
            rendering: Box::new(LoggingRenderingEngine::default()),
            background: Box::new(LoggingBackgroundServices::default()),
        }
    }
}
