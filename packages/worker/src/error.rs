use common::StoreError;
use thiserror::Error;

use crate::archive::ArchiveError;

/// Reasons a processing run ends in `FAILED`.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("File has no data to compress")]
    EmptyPayload,

    #[error("Compression failed: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Compression task aborted: {0}")]
    Join(String),
}

pub type Result<T> = std::result::Result<T, ProcessError>;
