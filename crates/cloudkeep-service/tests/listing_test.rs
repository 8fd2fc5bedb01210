//! Integration tests for directory listings and search.

mod common;

use cloudkeep_core::error::ErrorKind;
use cloudkeep_core::types::pagination::PageRequest;
use common::TestApp;

#[tokio::test]
async fn test_owner_listing_marks_shared_items() {
    let app = TestApp::new().await;
    let owner = app.create_user("lister").await;
    let grantee = app.create_user("lister-grantee").await;

    let shared_dir = app.create_dir(&owner, "Shared").await;
    let private_dir = app.create_dir(&owner, "Private").await;
    app.shares
        .share_directory(owner.id, shared_dir.id, grantee.id)
        .await
        .expect("share failed");

    let listing = app.listings.list_root(owner.id).await.expect("list failed");
    assert_eq!(listing.directories.len(), 2);

    let shared = listing
        .directories
        .iter()
        .find(|d| d.directory.id == shared_dir.id)
        .expect("shared dir listed");
    assert!(shared.provenance.is_shared_by_owner);
    assert!(!shared.provenance.is_shared);

    let private = listing
        .directories
        .iter()
        .find(|d| d.directory.id == private_dir.id)
        .expect("private dir listed");
    assert!(!private.provenance.is_shared_by_owner);
}

#[tokio::test]
async fn test_grantee_root_shows_pseudo_children() {
    let app = TestApp::new().await;
    let owner = app.create_user("pseudo-owner").await;
    let grantee = app.create_user("pseudo-grantee").await;

    let photos = app.create_dir(&owner, "Photos").await;
    let vacation = app
        .directories
        .create(owner.id, "Vacation", photos.id)
        .await
        .expect("create Vacation");
    let loose = app.create_dir(&owner, "Loose").await;
    let loose_file = app.upload_text(&owner, loose.id, "loose.txt").await;

    // Photos and its child Vacation are both granted; only Photos should
    // surface at the grantee's root. The individually shared file surfaces
    // as a pseudo-child too.
    app.shares
        .share_directory(owner.id, photos.id, grantee.id)
        .await
        .expect("share Photos");
    app.shares
        .share_directory(owner.id, vacation.id, grantee.id)
        .await
        .expect("share Vacation");
    app.shares
        .share_file(owner.id, loose_file.id, grantee.id)
        .await
        .expect("share file");

    let listing = app
        .listings
        .list_root(grantee.id)
        .await
        .expect("list failed");

    let dir_ids: Vec<_> = listing.directories.iter().map(|d| d.directory.id).collect();
    assert!(dir_ids.contains(&photos.id), "topmost grant surfaces");
    assert!(
        !dir_ids.contains(&vacation.id),
        "covered grant must not duplicate"
    );

    let file_entry = listing
        .files
        .iter()
        .find(|f| f.file.id == loose_file.id)
        .expect("shared file surfaces");
    assert!(file_entry.provenance.is_shared);
    assert_eq!(
        file_entry.provenance.shared_by.as_deref(),
        Some("pseudo-owner@example.com")
    );
}

#[tokio::test]
async fn test_grantee_sees_shared_directory_contents() {
    let app = TestApp::new().await;
    let owner = app.create_user("contents-owner").await;
    let grantee = app.create_user("contents-grantee").await;

    let dir = app.create_dir(&owner, "Docs").await;
    app.upload_text(&owner, dir.id, "a.txt").await;
    app.upload_text(&owner, dir.id, "b.txt").await;
    app.shares
        .share_directory(owner.id, dir.id, grantee.id)
        .await
        .expect("share failed");

    let listing = app
        .listings
        .list(grantee.id, dir.id)
        .await
        .expect("list failed");
    assert_eq!(listing.files.len(), 2);
    for file in &listing.files {
        assert!(file.provenance.is_shared);
        assert_eq!(
            file.provenance.shared_by.as_deref(),
            Some("contents-owner@example.com")
        );
    }
}

#[tokio::test]
async fn test_listing_requires_access() {
    let app = TestApp::new().await;
    let owner = app.create_user("closed-owner").await;
    let outsider = app.create_user("closed-outsider").await;
    let dir = app.create_dir(&owner, "Docs").await;

    let err = app
        .listings
        .list(outsider.id, dir.id)
        .await
        .expect_err("outsider listing must fail");
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_search_is_scoped_to_visible_files() {
    let app = TestApp::new().await;
    let owner = app.create_user("search-owner").await;
    let friend = app.create_user("search-friend").await;
    let stranger = app.create_user("search-stranger").await;

    let dir = app.create_dir(&owner, "Docs").await;
    app.upload_text(&owner, dir.id, "Quarterly Report.txt").await;
    app.upload_text(&owner, dir.id, "notes.txt").await;
    app.shares
        .share_directory(owner.id, dir.id, friend.id)
        .await
        .expect("share failed");

    // Case-insensitive substring match for the owner.
    let page = app
        .search
        .search(owner.id, "report", PageRequest::default())
        .await
        .expect("search failed");
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].filename, "Quarterly Report.txt");

    // The friend sees it through the directory grant.
    let page = app
        .search
        .search(friend.id, "report", PageRequest::default())
        .await
        .expect("search failed");
    assert_eq!(page.items.len(), 1);

    // A stranger sees nothing.
    let page = app
        .search
        .search(stranger.id, "report", PageRequest::default())
        .await
        .expect("search failed");
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn test_search_rejects_empty_queries() {
    let app = TestApp::new().await;
    let user = app.create_user("empty-search").await;

    let err = app
        .search
        .search(user.id, "   ", PageRequest::default())
        .await
        .expect_err("blank query must fail");
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let app = TestApp::new().await;
    let user = app.create_user("wildcard").await;
    let dir = app.create_dir(&user, "Docs").await;
    app.upload_text(&user, dir.id, "100%_done.txt").await;
    app.upload_text(&user, dir.id, "plain.txt").await;

    let page = app
        .search
        .search(user.id, "100%", PageRequest::default())
        .await
        .expect("search failed");
    assert_eq!(page.items.len(), 1, "% must not match everything");
}
