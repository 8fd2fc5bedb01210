//! Integration tests for account lifecycle.

mod common;

use cloudkeep_core::error::ErrorKind;
use cloudkeep_core::traits::content::ContentStore;
use common::TestApp;

#[tokio::test]
async fn test_registration_validates_and_deduplicates_emails() {
    let app = TestApp::new().await;

    for bad in ["", "no-at-sign", "user@nodot", "@example.com"] {
        let err = app
            .users
            .register(bad, false)
            .await
            .expect_err("bad email must be rejected");
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    let user = app
        .users
        .register("dupe@example.com", false)
        .await
        .expect("register failed");
    let err = app
        .users
        .register("dupe@example.com", false)
        .await
        .expect_err("duplicate email must fail");
    assert_eq!(err.kind, ErrorKind::Conflict);

    let found = app
        .users
        .find_by_email("dupe@example.com")
        .await
        .expect("lookup failed");
    assert_eq!(found.id, user.id);
}

#[tokio::test]
async fn test_user_deletion_removes_everything() {
    let app = TestApp::new().await;
    let doomed = app.create_user("doomed").await;
    let friend = app.create_user("friend").await;

    let dir = app.create_dir(&doomed, "Stuff").await;
    let file = app.upload_text(&doomed, dir.id, "data.txt").await;
    app.shares
        .share_file(doomed.id, file.id, friend.id)
        .await
        .expect("share out failed");

    // A grant pointing the other way must also disappear.
    let friend_dir = app.create_dir(&friend, "FriendStuff").await;
    app.shares
        .share_directory(friend.id, friend_dir.id, doomed.id)
        .await
        .expect("share in failed");

    app.users.delete(doomed.id).await.expect("delete failed");

    let err = app.users.find(doomed.id).await.expect_err("user gone");
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = app
        .files
        .get(friend.id, file.id)
        .await
        .expect_err("owned file gone");
    assert_eq!(err.kind, ErrorKind::NotFound);

    let blob_exists = app
        .content
        .exists(&file.content_ref)
        .await
        .expect("exists check");
    assert!(!blob_exists, "blobs go with the account");

    let received = app
        .shares
        .shares_received(friend.id, Default::default())
        .await
        .expect("list received");
    assert!(received.items.is_empty());
    let created = app
        .shares
        .shares_created(friend.id, Default::default())
        .await
        .expect("list created");
    assert!(created.items.is_empty());

    // The friend's own data is untouched.
    app.directories
        .get(friend.id, friend_dir.id)
        .await
        .expect("friend dir survives");
}
