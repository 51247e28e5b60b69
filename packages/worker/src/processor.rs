use std::sync::Arc;
use std::time::Instant;

use common::{FileId, FileRecord, FileStore};
use tracing::{error, info, warn};

use crate::archive::Archiver;
use crate::error::{ProcessError, Result};

/// How a processing run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Archive stored, record is `COMPLETED`.
    Completed,
    /// Processing failed. The record is `FAILED`, unless that write failed too,
    /// in which case it stays `PROCESSING`.
    Failed,
    /// No record exists for the id (never existed or deleted meanwhile).
    Missing,
}

/// Drives one file through `PROCESSING -> COMPLETED | FAILED`.
pub struct FileProcessor {
    store: Arc<dyn FileStore>,
    archiver: Arc<dyn Archiver>,
}

impl FileProcessor {
    pub fn new(store: Arc<dyn FileStore>, archiver: Arc<dyn Archiver>) -> Self {
        Self { store, archiver }
    }

    /// Process a single file. Never returns an error: every failure is logged
    /// and turned into a best-effort `FAILED` write.
    pub async fn process(&self, id: FileId) -> ProcessOutcome {
        let started = Instant::now();

        match self.try_process(id).await {
            Ok(outcome) => {
                if outcome == ProcessOutcome::Completed {
                    info!(
                        file_id = %id,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "File processed"
                    );
                }
                outcome
            }
            Err(e) => {
                error!(file_id = %id, error = %e, "File processing failed");
                self.mark_failed(id).await;
                ProcessOutcome::Failed
            }
        }
    }

    async fn try_process(&self, id: FileId) -> Result<ProcessOutcome> {
        // Written before any work starts so readers see the file in progress.
        let Some(file) = self.store.begin_processing(id).await? else {
            warn!(file_id = %id, "File not found, skipping notification");
            return Ok(ProcessOutcome::Missing);
        };

        info!(
            file_id = %id,
            name = %file.original_name,
            size = file.size,
            "Processing file"
        );

        if file.raw_data.is_empty() {
            return Err(ProcessError::EmptyPayload);
        }

        let FileRecord {
            raw_data,
            original_name,
            ..
        } = file;
        let archiver = Arc::clone(&self.archiver);
        let raw_len = raw_data.len();

        let archive =
            tokio::task::spawn_blocking(move || archiver.compress(&raw_data, &original_name))
                .await
                .map_err(|e| ProcessError::Join(e.to_string()))??;

        let archive_len = archive.len();
        if !self.store.complete(id, archive).await? {
            warn!(file_id = %id, "File deleted while processing, archive discarded");
            return Ok(ProcessOutcome::Missing);
        }

        info!(
            file_id = %id,
            raw_bytes = raw_len,
            archive_bytes = archive_len,
            "File marked COMPLETED"
        );
        Ok(ProcessOutcome::Completed)
    }

    /// Best-effort transition to `FAILED`. Not retried.
    async fn mark_failed(&self, id: FileId) {
        match self.store.fail(id).await {
            Ok(true) => info!(file_id = %id, "File marked FAILED"),
            Ok(false) => warn!(file_id = %id, "File vanished before it could be marked FAILED"),
            Err(e) => error!(
                file_id = %id,
                error = %e,
                "Failed to mark file FAILED, it remains PROCESSING"
            ),
        }
    }
}
