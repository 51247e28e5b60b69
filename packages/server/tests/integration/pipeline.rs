//! Ingest and worker running together over the in-memory bus.

use std::sync::Arc;

use common::mq::FileUploaded;
use common::{FileStatus, FileStore};
use mq::MessageStream;
use server::AppError;
use worker::{RunSummary, StopReason, Worker};

use crate::common::{CHANNEL, TestApp, unzip_single};

async fn subscribe(app: &TestApp) -> MessageStream<FileUploaded> {
    Worker::subscribe(app.bus.as_ref()).await.unwrap()
}

/// Close the channel and let a worker drain everything announced so far.
async fn drain(app: &TestApp, messages: MessageStream<FileUploaded>) -> RunSummary {
    app.bus.close_channel(CHANNEL).await;
    Worker::new(Arc::new(app.processor()), 2)
        .run(messages, std::future::pending())
        .await
}

#[tokio::test]
async fn greeting_is_uploaded_processed_and_deleted() {
    let app = TestApp::spawn();
    let messages = subscribe(&app).await;

    let meta = app.upload("u1", "greeting.txt", b"hello").await;
    assert_eq!(meta.status, FileStatus::Uploaded);
    assert_eq!(meta.size, 5);
    let id = meta.id;

    let summary = drain(&app, messages).await;

    assert_eq!(summary.received, 1);
    assert_eq!(summary.reason, StopReason::SubscriptionClosed);

    let file = app.files.get(id, "u1").await.unwrap();
    assert_eq!(file.status, FileStatus::Completed);
    assert!(file.is_consistent());
    let (name, data) = unzip_single(file.archive_data.as_deref().unwrap());
    assert_eq!(name, "greeting.txt");
    assert_eq!(data, b"hello");

    app.files.delete(id, "u1").await.unwrap();
    assert!(matches!(app.files.get(id, "u1").await, Err(AppError::NotFound)));
}

#[tokio::test]
async fn empty_upload_ends_failed() {
    let app = TestApp::spawn();
    let messages = subscribe(&app).await;
    let id = app.upload("u1", "empty.txt", b"").await.id;

    drain(&app, messages).await;

    let file = app.store.find(id).await.unwrap().unwrap();
    assert_eq!(file.status, FileStatus::Failed);
    assert!(file.archive_data.is_none());
}

#[tokio::test]
async fn every_upload_reaches_a_final_status() {
    let app = TestApp::spawn();
    let payloads: [&[u8]; 4] = [b"one", b"", b"three", b"four"];

    let messages = subscribe(&app).await;
    for (i, payload) in payloads.iter().enumerate() {
        app.upload("u1", &format!("f{i}.txt"), payload).await;
    }

    let summary = drain(&app, messages).await;

    assert_eq!(summary.received, 4);
    let files = app.files.list("u1").await.unwrap();
    assert_eq!(files.len(), 4);
    for summary in files {
        let file = app.store.find(summary.id).await.unwrap().unwrap();
        assert!(file.status.is_terminal(), "{} is {}", file.original_name, file.status);
        assert!(file.is_consistent());
        assert_eq!(file.status == FileStatus::Failed, file.raw_data.is_empty());
    }
}

#[tokio::test]
async fn reprocessed_file_is_archived_again() {
    let app = TestApp::spawn();
    let meta = app.upload("u1", "a.txt", b"again").await;
    app.process(meta.id).await;

    let messages = subscribe(&app).await;
    app.files.reprocess(meta.id, "u1").await.unwrap();

    let summary = drain(&app, messages).await;

    assert_eq!(summary.received, 1);
    let file = app.store.find(meta.id).await.unwrap().unwrap();
    assert_eq!(file.status, FileStatus::Completed);
    assert_eq!(unzip_single(file.archive_data.as_deref().unwrap()).1, b"again");
}
