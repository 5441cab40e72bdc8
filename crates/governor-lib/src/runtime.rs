//! Owner task and handle
//!
//! A single tokio task owns the [`Governor`]. Producers talk to it through a
//! cloneable [`GovernorHandle`]:
//! - acute OS events (thermal, memory pressure, low-memory warning) go over an
//!   unbounded channel that the task always drains first
//! - display refresh ticks use `try_send` and are dropped when the queue is full
//! - everything else is an ordinary bounded send
//! - reports are request/reply, answered on the owner task

use crate::error::{GovernorError, Result};
use crate::governor::Governor;
use crate::models::{
    ActivityContext, MemoryPressureLevel, PerformanceReport, PowerMode, ThermalState,
};
use crate::pressure::CleanupReport;
use crate::subscription::{GovernorNotification, SubscriberRegistry, Subscription};
use std::time::Instant;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

#[derive(Debug)]
enum AcuteEvent {
    Thermal(ThermalState),
    MemoryPressure(MemoryPressureLevel),
    LowMemoryWarning,
}

#[derive(Debug)]
enum GovernorEvent {
    DisplayRefresh(Instant),
    Context(ActivityContext),
    PowerMode(PowerMode),
    Battery(f32),
    RoutineCleanup(oneshot::Sender<CleanupReport>),
    Report(oneshot::Sender<PerformanceReport>),
}

/// Cloneable entry point for every producer
#[derive(Clone)]
pub struct GovernorHandle {
    events: mpsc::Sender<GovernorEvent>,
    acute: mpsc::UnboundedSender<AcuteEvent>,
    subscribers: SubscriberRegistry,
}

impl GovernorHandle {
    /// False once the owner task has stopped
    pub fn is_running(&self) -> bool {
        !self.events.is_closed()
    }

    /// Record a display refresh. Never blocks; a full queue drops the sample.
    pub fn display_refresh_tick(&self, at: Instant) -> Result<()> {
        match self.events.try_send(GovernorEvent::DisplayRefresh(at)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Event queue full, dropping frame sample");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(GovernorError::NotRunning),
        }
    }

    pub fn thermal_state_changed(&self, state: ThermalState) -> Result<()> {
        self.send_acute(AcuteEvent::Thermal(state))
    }

    pub fn memory_pressure(&self, level: MemoryPressureLevel) -> Result<()> {
        self.send_acute(AcuteEvent::MemoryPressure(level))
    }

    pub fn low_memory_warning(&self) -> Result<()> {
        self.send_acute(AcuteEvent::LowMemoryWarning)
    }

    pub async fn set_activity_context(&self, context: ActivityContext) -> Result<()> {
        self.send(GovernorEvent::Context(context)).await
    }

    pub async fn power_mode_changed(&self, mode: PowerMode) -> Result<()> {
        self.send(GovernorEvent::PowerMode(mode)).await
    }

    /// Battery level as a fraction in `[0, 1]`
    pub async fn battery_level_changed(&self, level: f32) -> Result<()> {
        self.send(GovernorEvent::Battery(level)).await
    }

    pub async fn run_routine_cleanup(&self) -> Result<CleanupReport> {
        let (tx, rx) = oneshot::channel();
        self.send(GovernorEvent::RoutineCleanup(tx)).await?;
        rx.await.map_err(|_| GovernorError::NotRunning)
    }

    /// Snapshot taken on the owner task
    pub async fn performance_report(&self) -> Result<PerformanceReport> {
        let (tx, rx) = oneshot::channel();
        self.send(GovernorEvent::Report(tx)).await?;
        rx.await.map_err(|_| GovernorError::NotRunning)
    }

    /// Callbacks run on the owner task and must not block
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&GovernorNotification) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    async fn send(&self, event: GovernorEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| GovernorError::NotRunning)
    }

    fn send_acute(&self, event: AcuteEvent) -> Result<()> {
        self.acute.send(event).map_err(|_| GovernorError::NotRunning)
    }
}

/// A running governor; dropping it without `stop_monitoring` leaves the task running
pub struct GovernorRuntime {
    handle: GovernorHandle,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl GovernorRuntime {
    pub fn handle(&self) -> GovernorHandle {
        self.handle.clone()
    }

    /// Tear down the owner task. Pending events are dropped; later calls on
    /// any handle return [`GovernorError::NotRunning`].
    pub async fn stop_monitoring(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            debug!(error = %e, "Governor task ended abnormally");
        }
    }
}

impl Governor {
    /// Move the governor onto its own task and begin monitoring.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_monitoring(mut self) -> GovernorRuntime {
        let capacity = self.config().channel_capacity.max(1);
        let (events_tx, events_rx) = mpsc::channel(capacity);
        let (acute_tx, acute_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = GovernorHandle {
            events: events_tx,
            acute: acute_tx,
            subscribers: self.subscribers(),
        };

        self.start(Instant::now());
        let task = tokio::spawn(run_owner_task(self, events_rx, acute_rx, shutdown_rx));

        GovernorRuntime {
            handle,
            shutdown_tx,
            task,
        }
    }
}

async fn run_owner_task(
    mut governor: Governor,
    mut events: mpsc::Receiver<GovernorEvent>,
    mut acute: mpsc::UnboundedReceiver<AcuteEvent>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let period = governor.config().sample_interval();
    info!(sample_interval_ms = period.as_millis() as u64, "Starting governor owner task");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            _ = shutdown.recv() => {
                info!("Shutting down governor owner task");
                break;
            }
            Some(event) = acute.recv() => {
                let now = Instant::now();
                match event {
                    AcuteEvent::Thermal(state) => governor.on_thermal_changed(state, now),
                    AcuteEvent::MemoryPressure(level) => governor.on_memory_pressure(level, now),
                    AcuteEvent::LowMemoryWarning => {
                        governor.on_low_memory_warning(now);
                    }
                }
            }
            Some(event) = events.recv() => {
                handle_event(&mut governor, event);
            }
            _ = ticker.tick() => {
                governor.tick(Instant::now());
            }
        }
    }

    governor.stop();
}

fn handle_event(governor: &mut Governor, event: GovernorEvent) {
    let now = Instant::now();
    match event {
        GovernorEvent::DisplayRefresh(at) => governor.on_display_refresh(at),
        GovernorEvent::Context(context) => {
            governor.set_activity_context(context, now);
        }
        GovernorEvent::PowerMode(mode) => governor.on_power_mode_changed(mode, now),
        GovernorEvent::Battery(level) => governor.on_battery_level_changed(level, now),
        GovernorEvent::RoutineCleanup(reply) => {
            let _ = reply.send(governor.run_routine_cleanup(now));
        }
        GovernorEvent::Report(reply) => {
            let _ = reply.send(governor.report(now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GovernorConfig;
    use crate::metrics::FixedMemoryProbe;
    use crate::observability::StructuredLogger;
    use crate::subsystems::{recording, TieredDataCache};
    use std::sync::{Arc, Mutex};

    fn spawn(cache: TieredDataCache) -> (GovernorRuntime, recording::Recorder) {
        let (subsystems, recorder) = recording::subsystems(cache);
        let governor = Governor::new(
            GovernorConfig::default(),
            subsystems,
            Box::new(FixedMemoryProbe::new(256, 1024)),
            StructuredLogger::new("test-watch"),
            Instant::now(),
        )
        .unwrap();
        (governor.start_monitoring(), recorder)
    }

    #[tokio::test]
    async fn test_report_round_trip() {
        let (runtime, _) = spawn(TieredDataCache::new());
        let handle = runtime.handle();

        handle
            .set_activity_context(ActivityContext::Scorecard)
            .await
            .unwrap();
        let report = handle.performance_report().await.unwrap();

        assert!(report.monitoring);
        assert_eq!(report.activity_context, ActivityContext::Scorecard);
        assert!(report
            .active_optimizations
            .contains(&"preload_scorecards".to_string()));

        runtime.stop_monitoring().await;
    }

    #[tokio::test]
    async fn test_low_memory_warning_handled_before_report() {
        let cache = TieredDataCache::new();
        cache.insert("tile:0:0", 4096, false);
        cache.insert("course:9", 4096, true);
        let (runtime, recorder) = spawn(cache.clone());
        let handle = runtime.handle();

        handle.low_memory_warning().unwrap();
        let report = handle.performance_report().await.unwrap();

        assert!(report.emergency_active);
        assert!(cache.is_empty());
        assert_eq!(recorder.log().suspensions, 1);

        runtime.stop_monitoring().await;
    }

    #[tokio::test]
    async fn test_acute_events_preempt_queued_events() {
        let (runtime, _) = spawn(TieredDataCache::new());
        let handle = runtime.handle();
        let order = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&order);
        let _subscription = handle.subscribe(move |n| match n {
            GovernorNotification::Cleanup(_) => sink.lock().unwrap().push("cleanup"),
            GovernorNotification::PowerModeChanged { .. } => sink.lock().unwrap().push("power"),
            _ => {}
        });

        // Both are queued before the owner task gets to run
        handle.power_mode_changed(PowerMode::Conservative).await.unwrap();
        handle.memory_pressure(MemoryPressureLevel::Critical).unwrap();
        handle.performance_report().await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["cleanup", "power"]);

        runtime.stop_monitoring().await;
    }

    #[tokio::test]
    async fn test_thermal_event_updates_report() {
        let (runtime, _) = spawn(TieredDataCache::new());
        let handle = runtime.handle();

        handle.thermal_state_changed(ThermalState::Serious).unwrap();
        let report = handle.performance_report().await.unwrap();

        assert_eq!(report.thermal_state, ThermalState::Serious);
        assert!(report
            .active_optimizations
            .contains(&"animations_disabled".to_string()));

        runtime.stop_monitoring().await;
    }

    #[tokio::test]
    async fn test_handle_fails_after_stop() {
        let (runtime, _) = spawn(TieredDataCache::new());
        let handle = runtime.handle();
        assert!(handle.is_running());

        runtime.stop_monitoring().await;

        assert!(!handle.is_running());
        assert_eq!(
            handle.performance_report().await.unwrap_err(),
            GovernorError::NotRunning
        );
        assert_eq!(
            handle.low_memory_warning().unwrap_err(),
            GovernorError::NotRunning
        );
        assert_eq!(
            handle.display_refresh_tick(Instant::now()).unwrap_err(),
            GovernorError::NotRunning
        );
    }

    #[tokio::test]
    async fn test_manual_routine_cleanup() {
        let cache = TieredDataCache::new();
        cache.insert("tile:0:0", 4096, false);
        let (runtime, _) = spawn(cache.clone());

        let report = runtime.handle().run_routine_cleanup().await.unwrap();
        assert_eq!(report.evicted_entries, 1);
        assert!(cache.is_empty());

        runtime.stop_monitoring().await;
    }
}
