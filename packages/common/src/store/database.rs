use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::Uuid;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

use super::entity::file;
use super::error::StoreError;
use super::traits::FileStore;
use crate::config::DatabaseConfig;
use crate::file::{FileId, FileRecord, FileSummary, NewFile};
use crate::file_status::FileStatus;

/// Column layout used for listing queries, so payload bytes are never loaded.
type SummaryRow = (
    Uuid,
    String,
    FileStatus,
    i64,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

const SUMMARY_COLUMNS: [file::Column; 7] = [
    file::Column::Id,
    file::Column::OriginalName,
    file::Column::Status,
    file::Column::Size,
    file::Column::MimeType,
    file::Column::CreatedAt,
    file::Column::UpdatedAt,
];

/// SeaORM-backed file store (PostgreSQL in production).
pub struct SeaOrmFileStore {
    db: DatabaseConnection,
}

impl SeaOrmFileStore {
    /// Open the connection pool and bring the schema up to date.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let mut opt = ConnectOptions::new(config.url.to_owned());

        opt.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .sqlx_logging(config.sqlx_logging);

        let db = Database::connect(opt).await?;
        db.get_schema_registry("common::store::entity::*")
            .sync(&db)
            .await?;

        info!(
            max_connections = config.max_connections,
            "File store connected"
        );

        Ok(Self { db })
    }

    /// Wrap an already initialised connection.
    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Apply a single-row update, mapping "no such row" to `None`.
    async fn update_one(
        &self,
        update: file::ActiveModel,
    ) -> Result<Option<file::Model>, StoreError> {
        match update.update(&self.db).await {
            Ok(model) => Ok(Some(model)),
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn stored_size(id: Uuid, size: i64) -> Result<u64, StoreError> {
    u64::try_from(size).map_err(|_| StoreError::Corrupt {
        id: id.to_string(),
        reason: format!("negative size {size}"),
    })
}

impl TryFrom<file::Model> for FileRecord {
    type Error = StoreError;

    fn try_from(model: file::Model) -> Result<Self, Self::Error> {
        let size = stored_size(model.id, model.size)?;

        Ok(Self {
            id: FileId::from(model.id),
            owner_id: model.owner_id,
            original_name: model.original_name,
            size,
            mime_type: model.mime_type,
            raw_data: model.raw_data,
            archive_data: model.archive_data,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

fn summary_from_row(row: SummaryRow) -> Result<FileSummary, StoreError> {
    let (id, original_name, status, size, mime_type, created_at, updated_at) = row;
    Ok(FileSummary {
        id: FileId::from(id),
        original_name,
        status,
        size: stored_size(id, size)?,
        mime_type,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl FileStore for SeaOrmFileStore {
    async fn create(&self, file: NewFile) -> Result<FileRecord, StoreError> {
        let now = Utc::now();
        let model = file::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(file.owner_id),
            original_name: Set(file.original_name),
            size: Set(file.data.len() as i64),
            mime_type: Set(file.mime_type),
            raw_data: Set(file.data),
            archive_data: Set(None),
            status: Set(FileStatus::Uploaded),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model.insert(&self.db).await?;
        FileRecord::try_from(inserted)
    }

    async fn find(&self, id: FileId) -> Result<Option<FileRecord>, StoreError> {
        file::Entity::find_by_id(id.as_uuid())
            .one(&self.db)
            .await?
            .map(FileRecord::try_from)
            .transpose()
    }

    async fn find_owned(
        &self,
        id: FileId,
        owner_id: &str,
    ) -> Result<Option<FileRecord>, StoreError> {
        file::Entity::find_by_id(id.as_uuid())
            .filter(file::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?
            .map(FileRecord::try_from)
            .transpose()
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<FileSummary>, StoreError> {
        let rows: Vec<SummaryRow> = file::Entity::find()
            .select_only()
            .columns(SUMMARY_COLUMNS)
            .filter(file::Column::OwnerId.eq(owner_id))
            .order_by_desc(file::Column::CreatedAt)
            .order_by_asc(file::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await?;

        rows.into_iter().map(summary_from_row).collect()
    }

    async fn rename(
        &self,
        id: FileId,
        owner_id: &str,
        new_name: &str,
    ) -> Result<Option<FileRecord>, StoreError> {
        let txn = self.db.begin().await?;

        let existing = file::Entity::find_by_id(id.as_uuid())
            .filter(file::Column::OwnerId.eq(owner_id))
            .lock(LockType::Update)
            .one(&txn)
            .await?;

        let Some(existing) = existing else {
            txn.rollback().await?;
            return Ok(None);
        };

        let mut active: file::ActiveModel = existing.into();
        active.original_name = Set(new_name.to_string());
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        FileRecord::try_from(updated).map(Some)
    }

    async fn delete(&self, id: FileId, owner_id: &str) -> Result<bool, StoreError> {
        let result = file::Entity::delete_many()
            .filter(file::Column::Id.eq(id.as_uuid()))
            .filter(file::Column::OwnerId.eq(owner_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn begin_processing(&self, id: FileId) -> Result<Option<FileRecord>, StoreError> {
        let update = file::ActiveModel {
            id: Set(id.as_uuid()),
            status: Set(FileStatus::Processing),
            archive_data: Set(None),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        self.update_one(update)
            .await?
            .map(FileRecord::try_from)
            .transpose()
    }

    async fn complete(&self, id: FileId, archive: Vec<u8>) -> Result<bool, StoreError> {
        let update = file::ActiveModel {
            id: Set(id.as_uuid()),
            status: Set(FileStatus::Completed),
            archive_data: Set(Some(archive)),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        Ok(self.update_one(update).await?.is_some())
    }

    async fn fail(&self, id: FileId) -> Result<bool, StoreError> {
        let update = file::ActiveModel {
            id: Set(id.as_uuid()),
            status: Set(FileStatus::Failed),
            archive_data: Set(None),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        Ok(self.update_one(update).await?.is_some())
    }

    async fn find_stale(
        &self,
        statuses: &[FileStatus],
        updated_before: DateTime<Utc>,
    ) -> Result<Vec<FileSummary>, StoreError> {
        let rows: Vec<SummaryRow> = file::Entity::find()
            .select_only()
            .columns(SUMMARY_COLUMNS)
            .filter(file::Column::Status.is_in(statuses.iter().copied()))
            .filter(file::Column::UpdatedAt.lt(updated_before))
            .order_by_asc(file::Column::UpdatedAt)
            .into_tuple()
            .all(&self.db)
            .await?;

        rows.into_iter().map(summary_from_row).collect()
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.db.clone().close().await?;
        info!("File store closed");
        Ok(())
    }
}
