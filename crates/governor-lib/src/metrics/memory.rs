//! Memory sampling
//!
//! The governor samples memory once per periodic tick through a
//! [`MemoryProbe`]. The probe abstracts the OS query so the control loop can
//! run against the live process or a scripted source.

use crate::buffer::RollingMetricBuffer;
use crate::models::MemoryUsage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use sysinfo::{System, SystemExt};

/// Source of memory usage snapshots
pub trait MemoryProbe: Send {
    /// Take a snapshot of current memory usage
    fn sample(&mut self) -> MemoryUsage;
}

/// Probe backed by the operating system's memory counters
pub struct SystemMemoryProbe {
    system: System,
}

impl SystemMemoryProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SystemMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SystemMemoryProbe {
    fn sample(&mut self) -> MemoryUsage {
        self.system.refresh_memory();

        let total = self.system.total_memory();
        let available = self.system.available_memory();
        MemoryUsage {
            used_bytes: total.saturating_sub(available),
            available_bytes: available,
            total_bytes: total,
        }
    }
}

/// Probe returning a value the host controls.
///
/// Cloning shares the underlying value, so a host (or a test) can keep one
/// clone and move the other into the governor.
#[derive(Debug, Clone)]
pub struct FixedMemoryProbe {
    used: Arc<AtomicU64>,
    total: u64,
}

impl FixedMemoryProbe {
    pub fn new(used_bytes: u64, total_bytes: u64) -> Self {
        Self {
            used: Arc::new(AtomicU64::new(used_bytes)),
            total: total_bytes,
        }
    }

    pub fn set_used(&self, used_bytes: u64) {
        self.used.store(used_bytes.min(self.total), Ordering::Relaxed);
    }

    /// Set usage as a fraction of total
    pub fn set_fraction(&self, fraction: f64) {
        let used = (self.total as f64 * fraction.clamp(0.0, 1.0)).round() as u64;
        self.set_used(used);
    }
}

impl MemoryProbe for FixedMemoryProbe {
    fn sample(&mut self) -> MemoryUsage {
        MemoryUsage::new(self.used.load(Ordering::Relaxed), self.total)
    }
}

/// Rolling memory history plus the latest snapshot
#[derive(Debug, Clone)]
pub struct MemorySampler {
    used_bytes: RollingMetricBuffer<u64>,
    latest: MemoryUsage,
}

impl MemorySampler {
    pub fn new(capacity: usize) -> Self {
        Self {
            used_bytes: RollingMetricBuffer::new(capacity),
            latest: MemoryUsage::default(),
        }
    }

    pub fn record(&mut self, usage: MemoryUsage) {
        self.used_bytes.append(usage.used_bytes);
        self.latest = usage;
    }

    pub fn latest(&self) -> MemoryUsage {
        self.latest
    }

    /// Average used bytes over the retained window
    pub fn average_used(&self) -> f64 {
        self.used_bytes.average()
    }

    pub fn peak_used(&self) -> Option<u64> {
        self.used_bytes.max()
    }

    pub fn history(&self) -> &RollingMetricBuffer<u64> {
        &self.used_bytes
    }

    pub fn reset(&mut self) {
        self.used_bytes.clear();
        self.latest = MemoryUsage::default();
    }
}
