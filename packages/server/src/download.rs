use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use common::{FileRecord, FileStatus};

use crate::error::ErrorBody;

/// What a download request yields for a file, depending on its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    /// Archive is ready. `file_name` already carries the `.zip` suffix.
    Ready { file_name: String, data: Vec<u8> },
    /// Not processed yet (`UPLOADED` or `PROCESSING`).
    Pending(FileStatus),
    /// Processing ended in `FAILED`.
    Failed,
    /// Status and stored bytes disagree, e.g. `COMPLETED` without an archive.
    Unavailable,
}

impl Download {
    pub fn from_record(record: FileRecord) -> Self {
        let FileRecord {
            original_name,
            archive_data,
            status,
            ..
        } = record;

        match (status, archive_data) {
            (FileStatus::Completed, Some(data)) if !data.is_empty() => Download::Ready {
                file_name: format!("{original_name}.zip"),
                data,
            },
            (FileStatus::Completed, _) => Download::Unavailable,
            (FileStatus::Failed, _) => Download::Failed,
            (status, _) => Download::Pending(status),
        }
    }
}

impl IntoResponse for Download {
    fn into_response(self) -> Response {
        match self {
            Download::Ready { file_name, data } => (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/zip".to_string()),
                    (header::CONTENT_DISPOSITION, content_disposition_value(&file_name)),
                ],
                data,
            )
                .into_response(),
            Download::Pending(status) => {
                tracing::debug!(%status, "Download requested before processing finished");
                (
                    StatusCode::ACCEPTED,
                    Json(ErrorBody {
                        code: "PROCESSING",
                        message: "File is still being processed. Please try again later.".into(),
                    }),
                )
                    .into_response()
            }
            Download::Failed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    code: "PROCESSING_FAILED",
                    message: "File processing failed. Please try re-uploading the file.".into(),
                }),
            )
                .into_response(),
            Download::Unavailable => {
                tracing::error!("Completed file has no archive to serve");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::internal())).into_response()
            }
        }
    }
}

/// Build a safe `Content-Disposition` header value.
fn content_disposition_value(file_name: &str) -> String {
    // Drop characters that would end the quoted string or split the header.
    let safe: String = file_name
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '"' | '\\'))
        .collect();
    let safe = if safe.trim().is_empty() || safe == ".zip" {
        "download.zip".to_string()
    } else {
        safe
    };
    format!("attachment; filename=\"{safe}\"")
}
