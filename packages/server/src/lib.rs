//! Ingest path and owner-scoped file operations.
//!
//! The HTTP layer and authentication sit outside this crate: callers pass an
//! already resolved owner id, and map [`AppError`] and [`Download`] to
//! responses through their `IntoResponse` impls.

pub mod config;
pub mod download;
pub mod error;
pub mod service;

pub use config::{ServerAppConfig, UploadConfig};
pub use download::Download;
pub use error::{AppError, ConnectError, ErrorBody};
pub use service::{FileService, Upload};
