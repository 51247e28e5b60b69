use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::error::StoreError;
use super::traits::FileStore;
use crate::file::{FileId, FileRecord, FileSummary, NewFile};
use crate::file_status::FileStatus;

/// In-process file store.
///
/// Every operation takes the map lock once, so each status change is a single
/// atomic step for concurrent readers.
#[derive(Default)]
pub struct MemoryFileStore {
    files: RwLock<HashMap<FileId, FileRecord>>,
    closed: AtomicBool,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable("store is closed".into()));
        }
        Ok(())
    }

    async fn update<F>(&self, id: FileId, apply: F) -> Result<Option<FileRecord>, StoreError>
    where
        F: FnOnce(&mut FileRecord) + Send,
    {
        self.ensure_open()?;
        let mut files = self.files.write().await;
        Ok(files.get_mut(&id).map(|file| {
            apply(file);
            file.updated_at = Utc::now();
            file.clone()
        }))
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn create(&self, file: NewFile) -> Result<FileRecord, StoreError> {
        self.ensure_open()?;
        let now = Utc::now();
        let record = FileRecord {
            id: FileId::new(),
            owner_id: file.owner_id,
            original_name: file.original_name,
            size: file.data.len() as u64,
            mime_type: file.mime_type,
            raw_data: file.data,
            archive_data: None,
            status: FileStatus::Uploaded,
            created_at: now,
            updated_at: now,
        };
        self.files.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find(&self, id: FileId) -> Result<Option<FileRecord>, StoreError> {
        self.ensure_open()?;
        Ok(self.files.read().await.get(&id).cloned())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<FileSummary>, StoreError> {
        self.ensure_open()?;
        let files = self.files.read().await;
        let mut summaries: Vec<FileSummary> = files
            .values()
            .filter(|f| f.owner_id == owner_id)
            .map(FileRecord::summary)
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }

    async fn rename(
        &self,
        id: FileId,
        owner_id: &str,
        new_name: &str,
    ) -> Result<Option<FileRecord>, StoreError> {
        self.ensure_open()?;
        let mut files = self.files.write().await;
        Ok(files
            .get_mut(&id)
            .filter(|f| f.owner_id == owner_id)
            .map(|file| {
                file.original_name = new_name.to_string();
                file.updated_at = Utc::now();
                file.clone()
            }))
    }

    async fn delete(&self, id: FileId, owner_id: &str) -> Result<bool, StoreError> {
        self.ensure_open()?;
        let mut files = self.files.write().await;
        if files.get(&id).is_some_and(|f| f.owner_id == owner_id) {
            files.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn begin_processing(&self, id: FileId) -> Result<Option<FileRecord>, StoreError> {
        self.update(id, |file| {
            file.status = FileStatus::Processing;
            file.archive_data = None;
        })
        .await
    }

    async fn complete(&self, id: FileId, archive: Vec<u8>) -> Result<bool, StoreError> {
        let updated = self
            .update(id, move |file| {
                file.status = FileStatus::Completed;
                file.archive_data = Some(archive);
            })
            .await?;
        Ok(updated.is_some())
    }

    async fn fail(&self, id: FileId) -> Result<bool, StoreError> {
        let updated = self
            .update(id, |file| {
                file.status = FileStatus::Failed;
                file.archive_data = None;
            })
            .await?;
        Ok(updated.is_some())
    }

    async fn find_stale(
        &self,
        statuses: &[FileStatus],
        updated_before: DateTime<Utc>,
    ) -> Result<Vec<FileSummary>, StoreError> {
        self.ensure_open()?;
        let files = self.files.read().await;
        let mut stale: Vec<FileSummary> = files
            .values()
            .filter(|f| statuses.contains(&f.status) && f.updated_at < updated_before)
            .map(FileRecord::summary)
            .collect();
        stale.sort_by_key(|f| f.updated_at);
        Ok(stale)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
