use common::{FileId, FileStatus, FileStore};
use server::AppError;
use server::error::NOT_FOUND_MESSAGE;

use crate::common::{TestApp, respond};

mod listing {
    use super::*;

    #[tokio::test]
    async fn lists_only_own_files_newest_first() {
        let app = TestApp::spawn();
        let first = app.upload("u1", "first.txt", b"1").await;
        app.upload("u2", "other.txt", b"2").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = app.upload("u1", "second.txt", b"22").await;

        let files = app.files.list("u1").await.unwrap();

        let ids: Vec<_> = files.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(files[0].original_name, "second.txt");
        assert_eq!(files[0].size, 2);
        assert_eq!(files[0].status, FileStatus::Uploaded);
    }

    #[tokio::test]
    async fn unknown_owner_has_no_files() {
        let app = TestApp::spawn();
        app.upload("u1", "a.txt", b"a").await;

        assert!(app.files.list("nobody").await.unwrap().is_empty());
    }
}

mod lookup {
    use super::*;

    #[tokio::test]
    async fn owner_gets_the_full_record() {
        let app = TestApp::spawn();
        let meta = app.upload("u1", "a.txt", b"abc").await;

        let file = app.files.get(meta.id, "u1").await.unwrap();

        assert_eq!(file.id, meta.id);
        assert_eq!(file.raw_data, b"abc");
    }

    #[tokio::test]
    async fn missing_and_foreign_files_look_the_same() {
        let app = TestApp::spawn();
        let meta = app.upload("u1", "a.txt", b"abc").await;

        let missing = app.files.get(FileId::new(), "u1").await.unwrap_err();
        let foreign = app.files.get(meta.id, "u2").await.unwrap_err();
        assert!(matches!(missing, AppError::NotFound));
        assert!(matches!(foreign, AppError::NotFound));

        let missing = respond(missing).await;
        let foreign = respond(foreign).await;
        assert_eq!(missing.status, 404);
        assert_eq!(missing.status, foreign.status);
        assert_eq!(missing.body, foreign.body);
        assert_eq!(missing.body["message"], NOT_FOUND_MESSAGE);
    }
}

mod renaming {
    use super::*;

    #[tokio::test]
    async fn owner_can_rename() {
        let app = TestApp::spawn();
        let meta = app.upload("u1", "old.txt", b"abc").await;

        let renamed = app.files.rename(meta.id, "u1", "  new.txt ").await.unwrap();

        assert_eq!(renamed.original_name, "new.txt");
        assert_eq!(renamed.status, FileStatus::Uploaded);
        assert!(renamed.updated_at >= meta.updated_at);
        let stored = app.store.find(meta.id).await.unwrap().unwrap();
        assert_eq!(stored.original_name, "new.txt");
        assert_eq!(stored.raw_data, b"abc");
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let app = TestApp::spawn();
        let meta = app.upload("u1", "old.txt", b"abc").await;

        let err = app.files.rename(meta.id, "u1", " ").await.unwrap_err();

        let res = respond(err).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "New name is required.");
        let stored = app.store.find(meta.id).await.unwrap().unwrap();
        assert_eq!(stored.original_name, "old.txt");
    }

    #[tokio::test]
    async fn rename_of_missing_or_foreign_file_changes_nothing() {
        let app = TestApp::spawn();
        let meta = app.upload("u1", "old.txt", b"abc").await;

        let foreign = app.files.rename(meta.id, "u2", "stolen.txt").await;
        let missing = app.files.rename(FileId::new(), "u1", "ghost.txt").await;

        assert!(matches!(foreign, Err(AppError::NotFound)));
        assert!(matches!(missing, Err(AppError::NotFound)));
        assert_eq!(app.store.len().await, 1);
        let stored = app.store.find(meta.id).await.unwrap().unwrap();
        assert_eq!(stored.original_name, "old.txt");
        assert_eq!(stored.updated_at, meta.updated_at);
    }
}

mod deleting {
    use super::*;

    #[tokio::test]
    async fn deleted_file_is_gone() {
        let app = TestApp::spawn();
        let meta = app.upload("u1", "a.txt", b"abc").await;

        app.files.delete(meta.id, "u1").await.unwrap();

        assert!(matches!(
            app.files.get(meta.id, "u1").await,
            Err(AppError::NotFound)
        ));
        assert!(app.files.list("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cannot_delete_someone_elses_file() {
        let app = TestApp::spawn();
        let meta = app.upload("u1", "a.txt", b"abc").await;

        let err = app.files.delete(meta.id, "u2").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound));
        assert!(app.files.get(meta.id, "u1").await.is_ok());
    }

    #[tokio::test]
    async fn deleting_twice_reports_not_found() {
        let app = TestApp::spawn();
        let meta = app.upload("u1", "a.txt", b"abc").await;

        app.files.delete(meta.id, "u1").await.unwrap();
        assert!(matches!(
            app.files.delete(meta.id, "u1").await,
            Err(AppError::NotFound)
        ));
    }
}

mod reprocessing {
    use super::*;

    #[tokio::test]
    async fn reprocess_announces_the_file_again() {
        let app = TestApp::spawn();
        let meta = app.upload("u1", "a.txt", b"abc").await;

        let again = app.files.reprocess(meta.id, "u1").await.unwrap();

        assert_eq!(again.id, meta.id);
        assert_eq!(app.announced().await, vec![meta.id, meta.id]);
    }

    #[tokio::test]
    async fn reprocess_picks_up_an_upload_that_was_never_announced() {
        let app = TestApp::spawn();
        app.bus.set_unavailable(true);
        let meta = app.upload("u1", "a.txt", b"abc").await;
        app.bus.set_unavailable(false);

        app.files.reprocess(meta.id, "u1").await.unwrap();

        assert_eq!(app.announced().await, vec![meta.id]);
    }

    #[tokio::test]
    async fn reprocess_surfaces_publish_failure() {
        let app = TestApp::spawn();
        let meta = app.upload("u1", "a.txt", b"abc").await;
        app.bus.set_unavailable(true);

        let err = app.files.reprocess(meta.id, "u1").await.unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn reprocess_of_foreign_file_is_not_found() {
        let app = TestApp::spawn();
        let meta = app.upload("u1", "a.txt", b"abc").await;

        let err = app.files.reprocess(meta.id, "u2").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound));
        assert_eq!(app.announced().await, vec![meta.id]);
    }
}
