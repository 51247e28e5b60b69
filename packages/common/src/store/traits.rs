use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StoreError;
use crate::file::{FileId, FileRecord, FileSummary, NewFile};
use crate::file_status::FileStatus;

/// Durable record of uploaded files and their processing status.
///
/// Owner-scoped operations treat a record owned by someone else exactly like
/// a missing one. Status writes are single-record updates, so a reader never
/// observes a status without its matching archive bytes.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist a new record with status `Uploaded`.
    async fn create(&self, file: NewFile) -> Result<FileRecord, StoreError>;

    /// Fetch a record regardless of owner.
    async fn find(&self, id: FileId) -> Result<Option<FileRecord>, StoreError>;

    /// Fetch a record owned by `owner_id`.
    async fn find_owned(
        &self,
        id: FileId,
        owner_id: &str,
    ) -> Result<Option<FileRecord>, StoreError> {
        Ok(self.find(id).await?.filter(|f| f.owner_id == owner_id))
    }

    /// List an owner's files, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<FileSummary>, StoreError>;

    /// Change the display name of an owned file.
    ///
    /// Returns `None` without touching anything if the file is missing or not owned.
    async fn rename(
        &self,
        id: FileId,
        owner_id: &str,
        new_name: &str,
    ) -> Result<Option<FileRecord>, StoreError>;

    /// Remove an owned file and all of its bytes.
    ///
    /// Returns `true` if a record was deleted.
    async fn delete(&self, id: FileId, owner_id: &str) -> Result<bool, StoreError>;

    /// Move a record to `Processing`, dropping any previous archive, and
    /// return the updated record. Returns `None` if the record does not exist.
    async fn begin_processing(&self, id: FileId) -> Result<Option<FileRecord>, StoreError>;

    /// Store the archive and move the record to `Completed` in one write.
    ///
    /// Returns `false` if the record no longer exists.
    async fn complete(&self, id: FileId, archive: Vec<u8>) -> Result<bool, StoreError>;

    /// Move the record to `Failed` and drop any archive bytes.
    ///
    /// Returns `false` if the record no longer exists.
    async fn fail(&self, id: FileId) -> Result<bool, StoreError>;

    /// Records in one of `statuses` that have not been touched since `updated_before`.
    async fn find_stale(
        &self,
        statuses: &[FileStatus],
        updated_before: DateTime<Utc>,
    ) -> Result<Vec<FileSummary>, StoreError>;

    /// Release the underlying resources. Further calls fail with
    /// [`StoreError::Unavailable`] or the backend's own error.
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
