//! Host-side producers for the standalone daemon

use governor_lib::{
    health::{components, HealthRegistry},
    GovernorHandle, GovernorNotification, Subscription,
};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Feed display refresh ticks at `rate_hz` until shutdown.
///
/// Stands in for a real display link on hosts without one.
pub async fn drive_display(
    handle: GovernorHandle,
    rate_hz: f64,
    mut shutdown: broadcast::Receiver<()>,
) {
    let period = Duration::from_secs_f64(1.0 / rate_hz.max(1.0));
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    info!(rate_hz = rate_hz, "Starting simulated display refresh");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if handle.display_refresh_tick(Instant::now()).is_err() {
                    debug!("Governor stopped, ending display refresh");
                    break;
                }
            }
            _ = shutdown.recv() => {
                info!("Shutting down display refresh");
                break;
            }
        }
    }
}

/// Mirror governor notifications into the health registry.
///
/// Notification callbacks run on the governor task and must not block, so they
/// only enqueue; a separate task applies them to the async registry.
pub fn bridge_health(handle: &GovernorHandle, registry: HealthRegistry) -> Subscription {
    let (tx, mut rx) = mpsc::unbounded_channel::<GovernorNotification>();

    let subscription = handle.subscribe(move |notification| {
        if matches!(notification, GovernorNotification::Report(_)) {
            return;
        }
        let _ = tx.send(notification.clone());
    });

    tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            registry.observe(&notification).await;
        }
        registry
            .set_unhealthy(components::POLICY, "Governor stopped")
            .await;
    });

    subscription
}
