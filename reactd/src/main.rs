use anyhow::Context;
use reactd::{config, runtime, telemetry, worker};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let config = config::load_config()?;

    telemetry::init_logging(&config.global.logging, &config.global.telemetry)
        .with_context(|| "failed to initialize logging")?;

    info!("Configuration loaded successfully");

    let bind_addr = config
        .global
        .network
        .bind_addr()
        .map_err(|e| anyhow::anyhow!("invalid bind address: {}", e))?;

    // Tokio runtime for signal handling only; network I/O stays on worker threads
    info!("Creating tokio runtime for signal handling");
    let tokio_runtime = runtime::create_runtime(&config.global.runtime)
        .with_context(|| "failed to create tokio runtime")?;

    info!("Spawning echo worker threads");
    let netio_handle = worker::spawn(
        bind_addr,
        &config.global.network,
        config.global.reactor.clone(),
        config.global.telemetry.clone(),
    )
    .with_context(|| "failed to spawn worker threads")?;

    info!(
        addr = %netio_handle.local_addr(),
        workers = netio_handle.worker_count(),
        "Echo service started"
    );

    let shutdown_notify = Arc::new(Notify::new());
    let shutdown_notify_clone = Arc::clone(&shutdown_notify);

    tokio_runtime.spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            return;
        }
        info!("Shutdown signal received");
        shutdown_notify_clone.notify_one();
    });

    // Wait for shutdown signal (blocks main thread)
    tokio_runtime.block_on(async {
        shutdown_notify.notified().await;
    });

    info!("Initiating graceful shutdown");

    // Blocks until workers exit
    let stats = netio_handle.shutdown();
    info!(
        accepted = stats.accepted,
        refused = stats.refused,
        bytes_echoed = stats.bytes_echoed,
        "Worker totals"
    );

    info!("Shutting down tokio runtime");
    tokio_runtime.shutdown_timeout(std::time::Duration::from_secs(
        config.global.runtime.shutdown_timeout_secs,
    ));

    info!("Shutdown complete");
    Ok(())
}
