use std::io::{Cursor, Read};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive entry name must not be empty")]
    EmptyEntryName,

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns a payload into a single-entry archive.
///
/// Implementations are pure: no side effects beyond computing the output, and
/// on error no partial output is returned.
pub trait Archiver: Send + Sync {
    fn compress(&self, data: &[u8], entry_name: &str) -> Result<Vec<u8>, ArchiveError>;
}

/// Deflate-compressed ZIP archiver.
#[derive(Debug, Clone, Copy)]
pub struct ZipArchiver {
    level: i64,
}

impl ZipArchiver {
    pub const MAX_LEVEL: i64 = 9;

    /// `level` is clamped to `0..=9`.
    pub fn new(level: i64) -> Self {
        Self {
            level: level.clamp(0, Self::MAX_LEVEL),
        }
    }

    pub fn level(&self) -> i64 {
        self.level
    }

    /// Stream `reader` into a single ZIP entry named `entry_name`.
    pub fn compress_reader<R: Read>(
        &self,
        mut reader: R,
        entry_name: &str,
    ) -> Result<Vec<u8>, ArchiveError> {
        if entry_name.trim().is_empty() {
            return Err(ArchiveError::EmptyEntryName);
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.level));

        writer.start_file(entry_name, options)?;
        std::io::copy(&mut reader, &mut writer)?;
        let cursor = writer.finish()?;

        Ok(cursor.into_inner())
    }
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self::new(Self::MAX_LEVEL)
    }
}

impl Archiver for ZipArchiver {
    fn compress(&self, data: &[u8], entry_name: &str) -> Result<Vec<u8>, ArchiveError> {
        self.compress_reader(data, entry_name)
    }
}
