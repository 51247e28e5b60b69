use std::sync::Arc;

use anyhow::Context;
use common::FileStore;
use common::store::database::SeaOrmFileStore;
use mq::RedisBus;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use worker::monitor::run_stale_file_monitor;
use worker::{FileProcessor, StopReason, Worker, WorkerAppConfig, ZipArchiver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = WorkerAppConfig::load().context("Failed to load config")?;
    info!(
        worker_id = %config.worker.id,
        concurrency = config.worker.concurrency,
        compression_level = config.worker.compression_level,
        "Worker starting"
    );

    let store: Arc<dyn FileStore> = Arc::new(
        SeaOrmFileStore::connect(&config.database)
            .await
            .context("Failed to open file store")?,
    );

    let bus = RedisBus::connect(&config.mq)
        .await
        .context("Failed to connect to notification bus")?;

    // Without a subscription every upload would stay UPLOADED, so this is fatal.
    let messages = Worker::subscribe(&bus)
        .await
        .context("Failed to subscribe to file-uploaded channel")?;

    let monitor = config.worker.stale_scan_interval().map(|interval| {
        tokio::spawn(run_stale_file_monitor(
            Arc::clone(&store),
            config.worker.stale_after(),
            interval,
        ))
    });

    let archiver = Arc::new(ZipArchiver::new(config.worker.compression_level));
    let processor = Arc::new(FileProcessor::new(Arc::clone(&store), archiver));
    let worker = Worker::new(processor, config.worker.concurrency);

    let summary = worker
        .run(messages, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!(
        received = summary.received,
        rejected = summary.rejected,
        reason = ?summary.reason,
        "Worker stopped"
    );

    if let Some(monitor) = monitor {
        monitor.abort();
    }
    if let Err(e) = store.close().await {
        warn!(error = %e, "Failed to close file store");
    }

    if summary.reason == StopReason::SubscriptionClosed {
        anyhow::bail!("Subscription to file-uploaded channel ended unexpectedly");
    }

    Ok(())
}
