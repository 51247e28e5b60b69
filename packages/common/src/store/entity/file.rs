use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::file_status::FileStatus;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(indexed)]
    pub owner_id: String,

    pub original_name: String,
    pub size: i64,
    pub mime_type: String,

    /// Uploaded bytes. Never rewritten after insert.
    pub raw_data: Vec<u8>,
    /// Set together with `status = COMPLETED`, cleared on every other transition.
    pub archive_data: Option<Vec<u8>>,

    #[sea_orm(indexed)]
    pub status: FileStatus,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
