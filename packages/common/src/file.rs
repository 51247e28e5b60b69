use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::file_status::FileStatus;

/// Opaque identifier of an uploaded file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
#[serde(transparent)]
pub struct FileId(Uuid);

impl FileId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for FileId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for FileId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Input for creating a file record.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub owner_id: String,
    pub original_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// A stored file together with its processing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: FileId,
    pub owner_id: String,
    pub original_name: String,
    pub size: u64,
    pub mime_type: String,
    /// Uploaded bytes, kept after processing so the file can be processed again.
    pub raw_data: Vec<u8>,
    /// Compressed archive, present only while `status` is `Completed`.
    pub archive_data: Option<Vec<u8>>,
    pub status: FileStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    /// Metadata view without any payload bytes.
    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            id: self.id,
            owner_id: self.owner_id.clone(),
            original_name: self.original_name.clone(),
            size: self.size,
            mime_type: self.mime_type.clone(),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            id: self.id,
            original_name: self.original_name.clone(),
            status: self.status,
            size: self.size,
            mime_type: self.mime_type.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Whether the archive bytes agree with the status.
    pub fn is_consistent(&self) -> bool {
        let has_archive = self.archive_data.as_ref().is_some_and(|a| !a.is_empty());
        has_archive == (self.status == FileStatus::Completed)
    }
}

/// File metadata returned by ingest and rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub id: FileId,
    pub owner_id: String,
    pub original_name: String,
    pub size: u64,
    pub mime_type: String,
    pub status: FileStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing entry for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub id: FileId,
    pub original_name: String,
    pub status: FileStatus,
    pub size: u64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
