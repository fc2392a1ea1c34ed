use std::time::Duration;

use anyhow::Context;
use floor_core::{AlertWorker, FloorService, setup_environment};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. dotenv, configuration, logging
    let config = setup_environment();
    tracing::info!(
        environment = %config.environment,
        release_policy = ?config.policy.release_policy,
        "Floor core starting"
    );

    // 2. Store and components
    let service = FloorService::open(config.clone()).context("failed to open floor store")?;
    if service.list_profiles()?.is_empty() {
        let owner = std::env::var("FLOOR_OWNER_NAME").unwrap_or_else(|_| "Owner".into());
        let master = service.bootstrap_master(&owner)?;
        tracing::info!(profile_id = master.id, "Created initial master profile");
    }

    // 3. Alert polling worker
    let shutdown = CancellationToken::new();
    let worker = AlertWorker::new(
        service.alert_generator(),
        Duration::from_secs(config.alert_poll_interval_secs.max(1)),
        service.alerts_changed(),
        shutdown.clone(),
    );
    let worker_handle = tokio::spawn(worker.run());

    // 4. Run until Ctrl-C
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");
    shutdown.cancel();

    if let Err(e) = worker_handle.await {
        tracing::error!(error = %e, "Alert worker task failed");
    }
    tracing::info!("Floor core stopped");
    Ok(())
}
