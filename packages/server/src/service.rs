use std::sync::Arc;

use common::mq::FileUploaded;
use common::store::database::SeaOrmFileStore;
use common::{FileId, FileMetadata, FileRecord, FileStore, FileSummary, NewFile, StoreError};
use mq::{NotificationBus, NotificationBusExt, RedisBus};
use tracing::{info, warn};

use crate::config::{ServerAppConfig, UploadConfig};
use crate::download::Download;
use crate::error::{AppError, ConnectError};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// An uploaded file as handed over by the HTTP layer.
#[derive(Debug, Clone)]
pub struct Upload {
    pub original_name: String,
    pub mime_type: String,
    /// Size declared by the client; must match `data.len()`.
    pub size: u64,
    pub data: Vec<u8>,
}

impl Upload {
    /// Upload whose declared size is taken from the bytes.
    pub fn new(
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            size: data.len() as u64,
            data,
        }
    }
}

/// File operations for an already authenticated owner.
///
/// Every lookup is scoped to `owner_id`; a file owned by someone else is
/// reported exactly like a missing one.
#[derive(Clone)]
pub struct FileService {
    store: Arc<dyn FileStore>,
    bus: Arc<dyn NotificationBus>,
    limits: UploadConfig,
}

impl FileService {
    pub fn new(
        store: Arc<dyn FileStore>,
        bus: Arc<dyn NotificationBus>,
        limits: UploadConfig,
    ) -> Self {
        Self { store, bus, limits }
    }

    /// Open the database store and the Redis bus named in `config`.
    ///
    /// The store is closed again if the bus cannot be reached.
    pub async fn connect(config: &ServerAppConfig) -> Result<Self, ConnectError> {
        let store = SeaOrmFileStore::connect(&config.database).await?;

        let bus = match RedisBus::connect(&config.mq).await {
            Ok(bus) => bus,
            Err(e) => {
                if let Err(close_err) = store.close().await {
                    warn!(error = %close_err, "Failed to close file store");
                }
                return Err(e.into());
            }
        };

        info!(
            max_upload_bytes = config.upload.max_size_bytes,
            "File service connected"
        );

        Ok(Self::new(
            Arc::new(store),
            Arc::new(bus),
            config.upload.clone(),
        ))
    }

    /// Release the store. Every later call fails with an internal error.
    pub async fn close(&self) -> Result<(), StoreError> {
        self.store.close().await
    }

    /// Store the upload as `UPLOADED` and announce it on `file-uploaded`.
    ///
    /// A failed announcement does not fail the upload: the record exists and
    /// can be picked up later through [`FileService::reprocess`].
    pub async fn ingest(&self, upload: Upload, owner_id: &str) -> Result<FileMetadata, AppError> {
        if upload.original_name.trim().is_empty() {
            return Err(AppError::Validation("File name is required.".into()));
        }
        if upload.size != upload.data.len() as u64 {
            return Err(AppError::Validation(format!(
                "Declared size {} does not match the {} bytes received.",
                upload.size,
                upload.data.len()
            )));
        }
        if upload.size > self.limits.max_size_bytes {
            return Err(AppError::Validation(format!(
                "File exceeds the {} byte upload limit.",
                self.limits.max_size_bytes
            )));
        }

        let mime_type = if upload.mime_type.trim().is_empty() {
            DEFAULT_MIME_TYPE.to_string()
        } else {
            upload.mime_type
        };

        let record = self
            .store
            .create(NewFile {
                owner_id: owner_id.to_string(),
                original_name: upload.original_name,
                mime_type,
                data: upload.data,
            })
            .await?;

        info!(
            file_id = %record.id,
            owner_id,
            size = record.size,
            "File uploaded"
        );

        if let Err(e) = self.bus.publish_message(&FileUploaded::new(record.id)).await {
            warn!(
                file_id = %record.id,
                error = %e,
                "Failed to announce upload, file will not be processed until reprocessed"
            );
        }

        Ok(record.metadata())
    }

    /// The owner's files, newest first.
    pub async fn list(&self, owner_id: &str) -> Result<Vec<FileSummary>, AppError> {
        Ok(self.store.list_by_owner(owner_id).await?)
    }

    pub async fn get(&self, id: FileId, owner_id: &str) -> Result<FileRecord, AppError> {
        self.store
            .find_owned(id, owner_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn rename(
        &self,
        id: FileId,
        owner_id: &str,
        new_name: &str,
    ) -> Result<FileMetadata, AppError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AppError::Validation("New name is required.".into()));
        }

        let record = self
            .store
            .rename(id, owner_id, new_name)
            .await?
            .ok_or(AppError::NotFound)?;

        info!(file_id = %id, new_name, "File renamed");
        Ok(record.metadata())
    }

    pub async fn delete(&self, id: FileId, owner_id: &str) -> Result<(), AppError> {
        if !self.store.delete(id, owner_id).await? {
            return Err(AppError::NotFound);
        }
        info!(file_id = %id, "File deleted");
        Ok(())
    }

    pub async fn download(&self, id: FileId, owner_id: &str) -> Result<Download, AppError> {
        let record = self.get(id, owner_id).await?;
        Ok(Download::from_record(record))
    }

    /// Announce an existing file on `file-uploaded` again.
    ///
    /// Unlike [`FileService::ingest`], a publish failure is an error here.
    pub async fn reprocess(&self, id: FileId, owner_id: &str) -> Result<FileMetadata, AppError> {
        let record = self.get(id, owner_id).await?;
        self.bus.publish_message(&FileUploaded::new(id)).await?;

        info!(file_id = %id, status = %record.status, "File queued for reprocessing");
        Ok(record.metadata())
    }
}
