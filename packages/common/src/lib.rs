pub mod config;
pub mod file;
pub mod file_status;
pub mod mq;
pub mod store;

pub use file::{FileId, FileMetadata, FileRecord, FileSummary, NewFile};
pub use file_status::FileStatus;
pub use store::{FileStore, StoreError};
