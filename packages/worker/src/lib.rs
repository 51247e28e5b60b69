pub mod archive;
pub mod config;
pub mod error;
pub mod monitor;
pub mod processor;
pub mod worker;

pub use archive::{ArchiveError, Archiver, ZipArchiver};
pub use config::{WorkerAppConfig, WorkerConfig};
pub use error::ProcessError;
pub use processor::{FileProcessor, ProcessOutcome};
pub use worker::{RunSummary, StopReason, Worker};
