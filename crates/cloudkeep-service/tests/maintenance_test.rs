//! Integration tests for the orphan sweep.

mod common;

use bytes::Bytes;

use cloudkeep_core::error::ErrorKind;
use cloudkeep_core::traits::content::ContentStore;
use common::TestApp;

#[tokio::test]
async fn test_sweep_removes_unreferenced_blobs() {
    let app = TestApp::new().await;
    let user = app.create_user("sweeper").await;
    let dir = app.create_dir(&user, "Docs").await;
    let kept = app.upload_text(&user, dir.id, "kept.txt").await;

    // A blob written outside any file row is an orphan.
    let orphan_ref = app
        .content
        .write(Bytes::from_static(b"stray"))
        .await
        .expect("write failed");

    let report = app.maintenance.clean_orphans().await.expect("sweep failed");
    assert_eq!(report.blobs_removed, 1);
    assert_eq!(report.rows_removed, 0);
    assert_eq!(report.errors, 0);

    assert!(!app.content.exists(&orphan_ref).await.expect("exists"));
    assert!(app.content.exists(&kept.content_ref).await.expect("exists"));
}

#[tokio::test]
async fn test_sweep_removes_rows_without_blobs() {
    let app = TestApp::new().await;
    let user = app.create_user("rowless").await;
    let friend = app.create_user("rowless-friend").await;
    let dir = app.create_dir(&user, "Docs").await;
    let file = app.upload_text(&user, dir.id, "ghost.txt").await;
    app.shares
        .share_file(user.id, file.id, friend.id)
        .await
        .expect("share failed");

    // Simulate a lost blob.
    app.content
        .delete(&file.content_ref)
        .await
        .expect("delete failed");

    let report = app.maintenance.clean_orphans().await.expect("sweep failed");
    assert_eq!(report.rows_removed, 1);
    assert_eq!(report.errors, 0);

    let err = app
        .files
        .get(user.id, file.id)
        .await
        .expect_err("row must be gone");
    assert_eq!(err.kind, ErrorKind::NotFound);
    let received = app
        .shares
        .shares_received(friend.id, Default::default())
        .await
        .expect("list received");
    assert!(received.items.is_empty(), "grants go with the row");
}

#[tokio::test]
async fn test_sweep_on_consistent_state_is_a_no_op() {
    let app = TestApp::new().await;
    let user = app.create_user("consistent").await;
    let dir = app.create_dir(&user, "Docs").await;
    app.upload_text(&user, dir.id, "a.txt").await;
    app.upload_text(&user, dir.id, "b.txt").await;

    let report = app.maintenance.clean_orphans().await.expect("sweep failed");
    assert_eq!(report.blobs_removed, 0);
    assert_eq!(report.rows_removed, 0);
    assert_eq!(report.errors, 0);
}
