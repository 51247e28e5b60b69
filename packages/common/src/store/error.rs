use thiserror::Error;

/// Errors that can occur while reading or writing file records.
#[derive(Debug, Error)]
pub enum StoreError {
    #[cfg(feature = "sea-orm")]
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The store has been closed or cannot be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A persisted row could not be mapped back into a record.
    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}
