//! Observer registry for governor notifications
//!
//! Subscribers register a callback and receive a [`Subscription`]; dropping
//! it unregisters the callback. Callbacks run on the governor's task and must
//! not block.

use crate::models::{ActivityContext, PerformanceLevel, PerformanceReport, PowerMode};
use crate::policy::{OptimizationDirectiveSet, PolicyReason};
use crate::pressure::CleanupReport;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Events published by the governor
#[derive(Debug, Clone, PartialEq)]
pub enum GovernorNotification {
    LevelChanged {
        from: PerformanceLevel,
        to: PerformanceLevel,
        composite_score: f64,
    },
    ContextChanged {
        from: ActivityContext,
        to: ActivityContext,
    },
    DirectivesApplied {
        directives: OptimizationDirectiveSet,
        reason: PolicyReason,
    },
    Cleanup(CleanupReport),
    EmergencyCleared,
    PowerModeChanged {
        from: PowerMode,
        to: PowerMode,
    },
    /// Periodic snapshot, published once per monitoring cycle
    Report(Box<PerformanceReport>),
}

type Callback = Arc<dyn Fn(&GovernorNotification) + Send + Sync>;
type SubscriberMap = DashMap<u64, Callback>;

/// Shared set of callbacks. Clones refer to the same registry.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    subscribers: Arc<SubscriberMap>,
    next_id: Arc<AtomicU64>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&GovernorNotification) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.insert(id, Arc::new(callback));
        Subscription {
            id,
            registry: Arc::downgrade(&self.subscribers),
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver a notification to every current subscriber
    pub fn publish(&self, notification: &GovernorNotification) {
        // Snapshot first so callbacks may subscribe or unsubscribe freely
        let callbacks: Vec<Callback> = self
            .subscribers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for callback in callbacks {
            callback(notification);
        }
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Registration handle; the callback stays registered while this lives
#[must_use = "dropping a Subscription unregisters its callback"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<SubscriberMap>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// False once the callback is unregistered or the registry is gone
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .map(|map| map.contains_key(&self.id))
            .unwrap_or(false)
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(map) = self.registry.upgrade() {
            map.remove(&self.id);
        }
    }
}
