use axum::Json;
use common::{FileStatus, FileStore};
use server::{AppError, Upload, UploadConfig};

use crate::common::{TestApp, respond};

mod accepted_uploads {
    use super::*;

    #[tokio::test]
    async fn upload_starts_uploaded_without_archive() {
        let app = TestApp::spawn();

        let meta = app.upload("u1", "greeting.txt", b"hello").await;

        assert_eq!(meta.status, FileStatus::Uploaded);
        assert_eq!(meta.size, 5);
        assert_eq!(meta.original_name, "greeting.txt");
        assert_eq!(meta.owner_id, "u1");
        assert_eq!(meta.mime_type, "text/plain");

        let stored = app.store.find(meta.id).await.unwrap().unwrap();
        assert_eq!(stored.raw_data, b"hello");
        assert!(stored.archive_data.is_none());
        assert!(stored.is_consistent());
    }

    #[tokio::test]
    async fn upload_is_announced_once_by_id() {
        let app = TestApp::spawn();

        let meta = app.upload("u1", "a.txt", b"abc").await;

        assert_eq!(app.announced().await, vec![meta.id]);
        assert_eq!(
            app.bus.published("file-uploaded").await,
            vec![meta.id.to_string()]
        );
    }

    #[tokio::test]
    async fn response_never_carries_payload_bytes() {
        let app = TestApp::spawn();
        let meta = app.upload("u1", "a.txt", b"secret").await;

        let res = respond(Json(meta)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["originalName"], "a.txt");
        assert_eq!(res.body["status"], "UPLOADED");
        assert!(res.body.get("rawData").is_none());
        assert!(res.body.get("archiveData").is_none());
    }

    #[tokio::test]
    async fn empty_payload_is_accepted() {
        let app = TestApp::spawn();

        let meta = app.upload("u1", "empty.txt", b"").await;

        assert_eq!(meta.size, 0);
        assert_eq!(app.announced().await, vec![meta.id]);
    }

    #[tokio::test]
    async fn missing_mime_type_falls_back_to_octet_stream() {
        let app = TestApp::spawn();

        let meta = app
            .files
            .ingest(Upload::new("blob", "  ", vec![1, 2, 3]), "u1")
            .await
            .unwrap();

        assert_eq!(meta.mime_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn publish_failure_does_not_fail_the_upload() {
        let app = TestApp::spawn();
        app.bus.set_unavailable(true);

        let meta = app.upload("u1", "a.txt", b"abc").await;

        let stored = app.store.find(meta.id).await.unwrap().unwrap();
        assert_eq!(stored.status, FileStatus::Uploaded);
        assert!(app.announced().await.is_empty());
    }
}

mod rejected_uploads {
    use super::*;

    #[tokio::test]
    async fn blank_name_is_a_validation_error() {
        let app = TestApp::spawn();

        let err = app
            .files
            .ingest(Upload::new("   ", "text/plain", b"abc".to_vec()), "u1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        let res = respond(err).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.store.is_empty().await);
        assert!(app.announced().await.is_empty());
    }

    #[tokio::test]
    async fn declared_size_must_match_bytes() {
        let app = TestApp::spawn();
        let upload = Upload {
            size: 10,
            ..Upload::new("a.txt", "text/plain", b"abc".to_vec())
        };

        let err = app.files.ingest(upload, "u1").await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(app.store.is_empty().await);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let app = TestApp::with_limits(UploadConfig { max_size_bytes: 4 });

        let err = app
            .files
            .ingest(Upload::new("a.txt", "text/plain", b"12345".to_vec()), "u1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        app.upload("u1", "b.txt", b"1234").await;
        assert_eq!(app.store.len().await, 1);
    }

    #[tokio::test]
    async fn store_failure_is_internal_and_not_announced() {
        let app = TestApp::spawn();
        app.store.close().await.unwrap();

        let err = app
            .files
            .ingest(Upload::new("a.txt", "text/plain", b"abc".to_vec()), "u1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        let res = respond(err).await;
        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "INTERNAL_ERROR");
        assert!(app.announced().await.is_empty());
    }
}
