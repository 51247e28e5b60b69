use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{FileStatus, FileStore, FileSummary, StoreError};
use tracing::{error, info, warn};

/// Periodically report files that have sat in `UPLOADED` or `PROCESSING` for
/// longer than `stale_after`. Reporting only: no record is modified.
pub async fn run_stale_file_monitor(
    store: Arc<dyn FileStore>,
    stale_after: Duration,
    scan_interval: Duration,
) {
    info!(
        stale_after_secs = stale_after.as_secs(),
        scan_interval_secs = scan_interval.as_secs(),
        "Starting stale file monitor"
    );

    let mut interval = tokio::time::interval(scan_interval);

    loop {
        interval.tick().await;

        if let Err(e) = scan_stale_files(store.as_ref(), stale_after).await {
            error!(error = %e, "Stale file scan failed");
        }
    }
}

/// Find and log stale files once.
pub async fn scan_stale_files(
    store: &dyn FileStore,
    stale_after: Duration,
) -> Result<Vec<FileSummary>, StoreError> {
    let stale_after = chrono::Duration::from_std(stale_after).unwrap_or(chrono::Duration::MAX);
    let threshold = Utc::now()
        .checked_sub_signed(stale_after)
        .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);

    let stale = store.find_stale(FileStatus::PENDING, threshold).await?;

    for file in &stale {
        warn!(
            file_id = %file.id,
            status = %file.status,
            updated_at = %file.updated_at,
            "File stuck without a final status"
        );
    }

    Ok(stale)
}
