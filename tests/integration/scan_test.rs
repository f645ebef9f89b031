//! Integration tests for reconciliation sweeps.

mod helpers;

use homevault_core::error::ErrorKind;
use homevault_database::repositories::user as user_repo;
use homevault_entity::node::NodeType;
use homevault_entity::user::NewUser;
use homevault_service::Actor;

use helpers::{MP3_BYTES, TestApp};

#[tokio::test]
async fn test_scan_new_catalogs_home_and_is_idempotent() {
    let app = TestApp::new().await;
    let (_, root, alice) = app.create_user("alice", false).await;
    app.write_home("alice", "music/live/set.mp3", MP3_BYTES);
    app.write_home("alice", "music/cover.txt", b"liner notes");
    app.write_home("alice", "todo.txt", b"- scan");

    let report = app.runtime.scanner.scan_new().await.expect("scan");
    assert_eq!(report.users, 1);
    assert_eq!(report.dirs_created.len(), 2);
    assert_eq!(report.files_created.len(), 3);
    assert_eq!(report.errors, 0);
    assert!(report.mismatches.is_empty());

    let nodes = &app.runtime.nodes;
    let set = nodes
        .resolve(&alice, root.id, "/music/live/set.mp3")
        .await
        .expect("resolve")
        .expect("cataloged");
    assert_eq!(set.node_type, NodeType::File);
    assert_eq!(set.mime_type, "audio/mpeg");
    assert_eq!(set.size, MP3_BYTES.len() as i64);
    assert_eq!(
        std::fs::read(app.runtime.layout.content_path(set.id)).expect("content"),
        MP3_BYTES
    );
    assert_eq!(app.runtime.queue.pending_count().await.expect("count"), 3);

    let home = app.runtime.layout.home_dir("alice");
    assert!(home.exists());
    assert!(!home.join("todo.txt").exists());
    assert!(!home.join("music").exists());

    let again = app.runtime.scanner.scan_new().await.expect("rescan");
    assert_eq!(again.created(), 0);
    assert_eq!(again.existing, 0);
    assert_eq!(app.runtime.queue.pending_count().await.expect("count"), 3);

    app.write_home("alice", "music/live/encore.mp3", MP3_BYTES);
    let more = app.runtime.scanner.scan_new().await.expect("scan more");
    assert_eq!(more.files_created.len(), 1);
    assert!(more.dirs_created.is_empty());
    assert_eq!(more.existing, 2);
    let encore = nodes
        .resolve(&alice, root.id, "/music/live/encore.mp3")
        .await
        .expect("resolve")
        .expect("cataloged");
    assert_eq!(encore.parent_id, set.parent_id);
}

#[tokio::test]
async fn test_scan_new_provisions_missing_roots() {
    let app = TestApp::new().await;
    let user = {
        let mut tx = app.runtime.db.begin_write().await.expect("tx");
        let user = user_repo::insert(
            &mut tx,
            &NewUser {
                name: "dave".to_string(),
                admin: false,
            },
        )
        .await
        .expect("insert");
        tx.commit().await.expect("commit");
        user
    };
    assert!(user.root_id.is_none());
    app.write_home("dave", "hello.txt", b"hi");

    let report = app.runtime.scanner.scan_new().await.expect("scan");
    assert_eq!(report.files_created.len(), 1);

    let user = app.runtime.users.by_id(user.id).await.expect("user");
    let root_id = user.root_id.expect("root provisioned");
    let hello = app
        .runtime
        .nodes
        .resolve(&Actor::for_user(&user), root_id, "/hello.txt")
        .await
        .expect("resolve");
    assert!(hello.is_some());
}

#[tokio::test]
async fn test_scan_new_reports_type_mismatch_without_fixing_it() {
    let app = TestApp::new().await;
    let (_, root, alice) = app.create_user("alice", false).await;
    let dir = app.mkdir(&alice, &root, "report.txt").await;
    app.write_home("alice", "report.txt", b"now a file");

    let report = app.runtime.scanner.scan_new().await.expect("scan");
    assert_eq!(report.mismatches, vec!["alice:/report.txt".to_string()]);
    assert_eq!(report.created(), 0);
    assert!(app.runtime.layout.home_dir("alice").join("report.txt").is_file());

    let still = app.runtime.nodes.get(&alice, dir.id).await.expect("kept");
    assert_eq!(still.node_type, NodeType::Directory);
}

#[tokio::test]
async fn test_scan_deleted_prunes_missing_content_and_empty_dirs() {
    let app = TestApp::new().await;
    let nodes = &app.runtime.nodes;
    let layout = &app.runtime.layout;
    let (_, root, alice) = app.create_user("alice", false).await;

    let a = app.mkdir(&alice, &root, "a").await;
    let b = app.mkdir(&alice, &a, "b").await;
    let c = app.new_file(&alice, &b, "c.txt", b"c").await;
    let keep = app.new_file(&alice, &a, "keep.txt", b"keep").await;
    let x = app.mkdir(&alice, &root, "x").await;
    let y = app.mkdir(&alice, &x, "y").await;
    let z = app.new_file(&alice, &y, "z.txt", b"z").await;
    let top = app.new_file(&alice, &root, "top.txt", b"top").await;

    for file in [&c, &z, &top] {
        std::fs::remove_file(layout.content_path(file.id)).expect("remove content");
    }

    let report = app.runtime.scanner.scan_deleted().await.expect("scan");
    assert_eq!(report.files_checked, 4);
    let mut files_removed = report.files_removed.clone();
    files_removed.sort();
    assert_eq!(files_removed, vec![c.id, z.id, top.id]);
    let mut dirs_removed = report.dirs_removed.clone();
    dirs_removed.sort();
    assert_eq!(dirs_removed, vec![b.id, x.id, y.id]);
    assert_eq!(report.errors, 0);

    assert!(nodes.get(&alice, a.id).await.is_ok());
    assert!(nodes.get(&alice, keep.id).await.is_ok());
    assert!(nodes.get(&alice, root.id).await.is_ok());
    let err = nodes.get(&alice, x.id).await.expect_err("pruned");
    assert_eq!(err.kind, ErrorKind::NotFound);

    let again = app.runtime.scanner.scan_deleted().await.expect("rescan");
    assert!(again.files_removed.is_empty());
    assert!(again.dirs_removed.is_empty());
}

#[tokio::test]
async fn test_deleted_node_stays_deleted_after_rescan() {
    let app = TestApp::new().await;
    let (_, root, alice) = app.create_user("alice", false).await;
    let nodes = &app.runtime.nodes;
    app.write_home("alice", "photos/beach.txt", b"sand");

    app.runtime.scanner.scan_new().await.expect("ingest");
    let photos = nodes
        .resolve(&alice, root.id, "/photos")
        .await
        .expect("resolve")
        .expect("cataloged");
    let deleted = nodes.delete(&alice, photos.id, true).await.expect("delete");
    assert_eq!(deleted.len(), 2);

    let report = app.runtime.scanner.scan_all().await.expect("rescan");
    assert_eq!(report.new.created(), 0);
    assert!(report.deleted.files_removed.is_empty());
    assert!(
        nodes
            .resolve(&alice, root.id, "/photos/beach.txt")
            .await
            .expect("resolve")
            .is_none()
    );
}

#[tokio::test]
async fn test_renamed_and_moved_nodes_are_not_duplicated_by_rescan() {
    let app = TestApp::new().await;
    let (_, root, alice) = app.create_user("alice", false).await;
    let nodes = &app.runtime.nodes;
    app.write_home("alice", "todo.txt", b"- scan");
    app.write_home("alice", "inbox/draft.txt", b"draft");
    app.runtime.scanner.scan_new().await.expect("ingest");

    let todo = nodes
        .resolve(&alice, root.id, "/todo.txt")
        .await
        .expect("resolve")
        .expect("cataloged");
    let draft = nodes
        .resolve(&alice, root.id, "/inbox/draft.txt")
        .await
        .expect("resolve")
        .expect("cataloged");
    nodes.rename(&alice, todo.id, "done.txt").await.expect("rename");
    nodes.move_node(&alice, draft.id, root.id).await.expect("move");

    let report = app.runtime.scanner.scan_new().await.expect("rescan");
    assert_eq!(report.created(), 0);

    let mut names: Vec<String> = nodes
        .children(&alice, root.id)
        .await
        .expect("children")
        .into_iter()
        .map(|n| n.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["done.txt", "draft.txt", "inbox"]);
    assert_eq!(
        std::fs::read(app.runtime.layout.content_path(todo.id)).expect("content"),
        b"- scan"
    );
}

#[tokio::test]
async fn test_sweeps_exclude_each_other() {
    let app = TestApp::new().await;
    app.create_user("alice", false).await;
    let scanner = &app.runtime.scanner;

    let held = scanner.lease().try_acquire("test").expect("lease");
    let err = scanner.scan_new().await.expect_err("busy");
    assert_eq!(err.kind, ErrorKind::Conflict);
    let err = scanner.scan_deleted().await.expect_err("busy");
    assert_eq!(err.kind, ErrorKind::Conflict);

    drop(held);
    scanner.scan_all().await.expect("free again");
}
