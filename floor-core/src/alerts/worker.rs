//! Alert polling worker
//!
//! Refreshes alerts on a fixed interval, immediately when notification
//! settings change, and exits on shutdown.
//!
//! redb transactions are synchronous, so each refresh runs on the blocking
//! pool.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use super::AlertGenerator;
use shared::util::now_millis;

pub struct AlertWorker {
    generator: AlertGenerator,
    interval: Duration,
    settings_changed: Arc<Notify>,
    shutdown: CancellationToken,
}

impl AlertWorker {
    pub fn new(
        generator: AlertGenerator,
        interval: Duration,
        settings_changed: Arc<Notify>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            generator,
            interval,
            settings_changed,
            shutdown,
        }
    }

    /// Main loop: tick, settings change, or shutdown
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Alert worker started");

        // first tick fires immediately
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh().await;
                }
                _ = self.settings_changed.notified() => {
                    tracing::debug!("Notification settings changed, refreshing alerts");
                    self.refresh().await;
                }
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Alert worker received shutdown signal");
                    return;
                }
            }
        }
    }

    async fn refresh(&self) {
        let generator = self.generator.clone();
        match tokio::task::spawn_blocking(move || generator.refresh(now_millis())).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Alert refresh failed"),
            Err(e) => tracing::error!(error = %e, "Alert refresh task panicked"),
        }
    }
}
