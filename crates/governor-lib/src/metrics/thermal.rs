//! Thermal state tracking

use crate::buffer::RollingMetricBuffer;
use crate::models::ThermalState;

/// Current thermal state plus a history of transition ordinals
#[derive(Debug, Clone)]
pub struct ThermalMonitor {
    history: RollingMetricBuffer<u8>,
    current: ThermalState,
}

impl ThermalMonitor {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: RollingMetricBuffer::new(capacity),
            current: ThermalState::Nominal,
        }
    }

    /// Record an OS transition notification; returns true if the state changed.
    ///
    /// Every notification is appended, repeated ones included, so the trend
    /// reflects how long the device has sat in each state.
    pub fn record(&mut self, state: ThermalState) -> bool {
        self.history.append(state.ordinal());
        let changed = self.current != state;
        self.current = state;
        changed
    }

    pub fn current(&self) -> ThermalState {
        self.current
    }

    /// Mean ordinal over recent notifications (0 = nominal, 3 = critical)
    pub fn trend(&self) -> f64 {
        self.history.average()
    }

    /// Hottest state seen in the retained history
    pub fn peak(&self) -> ThermalState {
        self.history
            .max()
            .and_then(ThermalState::from_ordinal)
            .unwrap_or(self.current)
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.current = ThermalState::Nominal;
    }
}
