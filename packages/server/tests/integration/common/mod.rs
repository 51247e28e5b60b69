use std::io::Read;
use std::sync::Arc;

use axum::http::HeaderMap;
use axum::response::IntoResponse;
use common::store::MemoryFileStore;
use common::{FileId, FileMetadata, FileStore};
use mq::MemoryBus;
use serde_json::Value;
use worker::{FileProcessor, ProcessOutcome, ZipArchiver};

use server::{FileService, Upload, UploadConfig};

pub const CHANNEL: &str = "file-uploaded";

/// File service wired to in-memory collaborators, plus handles on those
/// collaborators so tests can inspect and sabotage them.
pub struct TestApp {
    pub store: Arc<MemoryFileStore>,
    pub bus: Arc<MemoryBus>,
    pub files: FileService,
}

/// An operation's result rendered the way the HTTP layer would send it.
pub struct TestResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// Raw response body.
    pub bytes: Vec<u8>,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_limits(UploadConfig::default())
    }

    pub fn with_limits(limits: UploadConfig) -> Self {
        let store = Arc::new(MemoryFileStore::new());
        let bus = Arc::new(MemoryBus::new());
        let files = FileService::new(store.clone(), bus.clone(), limits);
        Self { store, bus, files }
    }

    /// Upload `data` for `owner`, panicking if the upload is rejected.
    pub async fn upload(&self, owner: &str, name: &str, data: &[u8]) -> FileMetadata {
        self.files
            .ingest(Upload::new(name, "text/plain", data.to_vec()), owner)
            .await
            .unwrap_or_else(|e| panic!("Upload of {name} failed: {e:?}"))
    }

    /// Ids announced on `file-uploaded`, in order.
    pub async fn announced(&self) -> Vec<FileId> {
        self.bus
            .published(CHANNEL)
            .await
            .iter()
            .map(|payload| payload.parse().expect("announced payload is a file id"))
            .collect()
    }

    pub fn processor(&self) -> FileProcessor {
        let store: Arc<dyn FileStore> = self.store.clone();
        FileProcessor::new(store, Arc::new(ZipArchiver::default()))
    }

    /// Run the processing routine for `id`, as the worker would on a notification.
    pub async fn process(&self, id: FileId) -> ProcessOutcome {
        self.processor().process(id).await
    }
}

pub async fn respond(response: impl IntoResponse) -> TestResponse {
    let response = response.into_response();
    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body")
        .to_vec();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse {
        status,
        headers,
        bytes,
        body,
    }
}

/// Entry name and contents of a single-entry zip archive.
pub fn unzip_single(archive: &[u8]) -> (String, Vec<u8>) {
    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(archive)).expect("valid zip");
    assert_eq!(zip.len(), 1, "archive should hold exactly one entry");
    let mut entry = zip.by_index(0).expect("first entry");
    let mut data = Vec::new();
    entry.read_to_end(&mut data).expect("entry readable");
    (entry.name().to_string(), data)
}
