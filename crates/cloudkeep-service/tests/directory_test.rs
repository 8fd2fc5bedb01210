//! Integration tests for directory tree operations.

mod common;

use cloudkeep_core::error::ErrorKind;
use common::TestApp;

#[tokio::test]
async fn test_root_is_created_once() {
    let app = TestApp::new().await;
    let user = app.create_user("rootuser").await;

    let (first, second) = tokio::join!(
        app.directories.get_or_create_root(user.id),
        app.directories.get_or_create_root(user.id),
    );
    let first = first.expect("first root access failed");
    let second = second.expect("second root access failed");

    assert_eq!(first.id, second.id);
    assert!(first.is_root());
    assert_eq!(first.owner_id, user.id);
}

#[tokio::test]
async fn test_create_requires_owned_parent() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let alice_dir = app.create_dir(&alice, "Documents").await;

    let err = app
        .directories
        .create(bob.id, "Intruder", alice_dir.id)
        .await
        .expect_err("creating under a foreign parent must fail");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_rename_rejects_invalid_names() {
    let app = TestApp::new().await;
    let user = app.create_user("renamer").await;
    let dir = app.create_dir(&user, "Old").await;

    for bad in ["", "   ", &"x".repeat(256)] {
        let err = app
            .directories
            .rename(user.id, dir.id, bad)
            .await
            .expect_err("invalid name must be rejected");
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    let renamed = app
        .directories
        .rename(user.id, dir.id, "  New  ")
        .await
        .expect("rename failed");
    assert_eq!(renamed.name, "New");
}

#[tokio::test]
async fn test_move_into_own_subtree_is_rejected() {
    let app = TestApp::new().await;
    let user = app.create_user("mover").await;
    let a = app.create_dir(&user, "a").await;
    let b = app
        .directories
        .create(user.id, "b", a.id)
        .await
        .expect("create b");
    let c = app
        .directories
        .create(user.id, "c", b.id)
        .await
        .expect("create c");

    // Into itself.
    let err = app
        .directories
        .move_directory(user.id, a.id, a.id)
        .await
        .expect_err("self move must fail");
    assert_eq!(err.kind, ErrorKind::CyclicMove);

    // Into a grandchild.
    let err = app
        .directories
        .move_directory(user.id, a.id, c.id)
        .await
        .expect_err("descendant move must fail");
    assert_eq!(err.kind, ErrorKind::CyclicMove);

    // The tree is unchanged after the failed attempts.
    let unchanged = app
        .directories
        .get(user.id, c.id)
        .await
        .expect("c still readable");
    assert_eq!(unchanged.parent_id, Some(b.id));
    let unchanged = app
        .directories
        .get(user.id, a.id)
        .await
        .expect("a still readable");
    let root = app
        .directories
        .get_or_create_root(user.id)
        .await
        .expect("root");
    assert_eq!(unchanged.parent_id, Some(root.id));
}

#[tokio::test]
async fn test_opposing_moves_cannot_commit_a_cycle() {
    let app = TestApp::new().await;
    let user = app.create_user("racer").await;
    let a = app.create_dir(&user, "a").await;
    let b = app.create_dir(&user, "b").await;

    // Two opposing moves issued together: whichever lands first makes the
    // other a descendant move, which must fail rather than close a cycle.
    let (ab, ba) = tokio::join!(
        app.directories.move_directory(user.id, a.id, b.id),
        app.directories.move_directory(user.id, b.id, a.id),
    );
    assert!(
        ab.is_err() || ba.is_err(),
        "opposing moves must not both succeed"
    );
    if let Err(e) = &ab {
        assert_eq!(e.kind, ErrorKind::CyclicMove);
    }
    if let Err(e) = &ba {
        assert_eq!(e.kind, ErrorKind::CyclicMove);
    }

    let a_after = app.directories.get(user.id, a.id).await.expect("a readable");
    let b_after = app.directories.get(user.id, b.id).await.expect("b readable");
    assert!(
        !(a_after.parent_id == Some(b.id) && b_after.parent_id == Some(a.id)),
        "a and b must not end up as each other's parent"
    );
}

#[tokio::test]
async fn test_move_between_owners_is_forbidden() {
    let app = TestApp::new().await;
    let alice = app.create_user("alice2").await;
    let bob = app.create_user("bob2").await;
    let alice_dir = app.create_dir(&alice, "Mine").await;
    let bob_dir = app.create_dir(&bob, "Theirs").await;

    // Bob can see Alice's directory through a grant but still cannot
    // pull it into his own tree.
    app.shares
        .share_directory(alice.id, alice_dir.id, bob.id)
        .await
        .expect("share failed");

    let err = app
        .directories
        .move_directory(bob.id, alice_dir.id, bob_dir.id)
        .await
        .expect_err("cross-owner move must fail");
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_root_cannot_be_moved_or_deleted() {
    let app = TestApp::new().await;
    let user = app.create_user("rooted").await;
    let root = app
        .directories
        .get_or_create_root(user.id)
        .await
        .expect("root");
    let dir = app.create_dir(&user, "Target").await;

    let err = app
        .directories
        .move_directory(user.id, root.id, dir.id)
        .await
        .expect_err("moving the root must fail");
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = app
        .directories
        .delete(user.id, root.id)
        .await
        .expect_err("deleting the root must fail");
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_delete_cascades_through_subtree() {
    let app = TestApp::new().await;
    let owner = app.create_user("cascade").await;
    let grantee = app.create_user("cascade-grantee").await;

    let parent = app.create_dir(&owner, "parent").await;
    let child = app
        .directories
        .create(owner.id, "child", parent.id)
        .await
        .expect("create child");
    let file = app.upload_text(&owner, child.id, "deep.txt").await;
    app.shares
        .share_file(owner.id, file.id, grantee.id)
        .await
        .expect("share file");
    app.shares
        .share_directory(owner.id, child.id, grantee.id)
        .await
        .expect("share child");

    app.directories
        .delete(owner.id, parent.id)
        .await
        .expect("delete failed");

    // Everything under the subtree is gone, including grants and blobs.
    let err = app
        .directories
        .get(owner.id, child.id)
        .await
        .expect_err("child must be gone");
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = app
        .files
        .get(owner.id, file.id)
        .await
        .expect_err("file must be gone");
    assert_eq!(err.kind, ErrorKind::NotFound);

    use cloudkeep_core::traits::content::ContentStore;
    let blob_exists = app
        .content
        .exists(&file.content_ref)
        .await
        .expect("exists check");
    assert!(!blob_exists, "blob should be removed with its row");

    let received = app
        .shares
        .shares_received(grantee.id, Default::default())
        .await
        .expect("list received");
    assert!(received.items.is_empty(), "grants must not outlive the item");
}

#[tokio::test]
async fn test_delete_cascade_covers_directories_moved_in() {
    let app = TestApp::new().await;
    let owner = app.create_user("mover-cascade").await;
    let grantee = app.create_user("mover-cascade-grantee").await;

    let target = app.create_dir(&owner, "target").await;
    let wanderer = app.create_dir(&owner, "wanderer").await;
    let file = app.upload_text(&owner, wanderer.id, "w.txt").await;
    app.shares
        .share_directory(owner.id, wanderer.id, grantee.id)
        .await
        .expect("share wanderer");

    // The wanderer joins the target subtree only after its grant exists.
    app.directories
        .move_directory(owner.id, wanderer.id, target.id)
        .await
        .expect("move failed");

    app.directories
        .delete(owner.id, target.id)
        .await
        .expect("delete failed");

    let err = app
        .directories
        .get(owner.id, wanderer.id)
        .await
        .expect_err("moved-in directory must be gone");
    assert_eq!(err.kind, ErrorKind::NotFound);

    use cloudkeep_core::traits::content::ContentStore;
    let blob_exists = app
        .content
        .exists(&file.content_ref)
        .await
        .expect("exists check");
    assert!(!blob_exists, "moved-in blobs go with the subtree");

    let received = app
        .shares
        .shares_received(grantee.id, Default::default())
        .await
        .expect("list received");
    assert!(
        received.items.is_empty(),
        "grants on moved-in directories must not survive the cascade"
    );
}
