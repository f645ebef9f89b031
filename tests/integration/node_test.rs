//! Integration tests for the node tree: resolution and mutations.

mod helpers;

use homevault_core::config::IngestMode;
use homevault_core::error::ErrorKind;
use homevault_core::types::NodeId;
use homevault_entity::node::{Node, NodeType};
use homevault_service::Actor;

use helpers::{PNG_BYTES, TestApp};

async fn child_names(app: &TestApp, actor: &Actor, dir: &Node) -> Vec<String> {
    let mut names: Vec<String> = app
        .runtime
        .nodes
        .children(actor, dir.id)
        .await
        .expect("children")
        .into_iter()
        .map(|n| n.name)
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_alice_scenario() {
    let app = TestApp::new().await;
    let nodes = &app.runtime.nodes;
    let (_, root, alice) = app.create_user("alice", false).await;
    assert_eq!(root.id, NodeId(1));
    assert!(root.is_root());

    let docs = app.mkdir(&alice, &root, "docs").await;
    assert_eq!(docs.id, NodeId(2));
    assert_eq!(docs.node_type, NodeType::Directory);

    let file = app.new_file(&alice, &docs, "a.txt", b"hello").await;
    assert_eq!(file.id, NodeId(3));
    assert_eq!(file.mime_type, "text/plain");
    assert_eq!(file.size, 5);

    let physical = app.runtime.layout.content_path(file.id);
    let renamed = nodes.rename(&alice, file.id, "b.txt").await.expect("rename");
    assert_eq!(renamed.name, "b.txt");
    assert_eq!(app.runtime.layout.content_path(renamed.id), physical);
    assert!(physical.exists());

    let err = nodes.delete(&alice, docs.id, false).await.expect_err("non-empty");
    assert_eq!(err.kind, ErrorKind::BadRequest);

    let deleted = nodes.delete(&alice, docs.id, true).await.expect("recursive");
    let ids: Vec<NodeId> = deleted.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![NodeId(3), NodeId(2)]);

    let err = nodes.get(&alice, NodeId(3)).await.expect_err("gone");
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(!physical.exists());
}

#[tokio::test]
async fn test_make_dir_twice_conflicts() {
    let app = TestApp::new().await;
    let (_, root, alice) = app.create_user("alice", false).await;

    app.mkdir(&alice, &root, "photos").await;
    let err = app
        .runtime
        .nodes
        .make_dir(&alice, root.id, "photos")
        .await
        .expect_err("duplicate");
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(child_names(&app, &alice, &root).await, vec!["photos"]);
}

#[tokio::test]
async fn test_invalid_names_are_rejected() {
    let app = TestApp::new().await;
    let (_, root, alice) = app.create_user("alice", false).await;

    for name in ["", ".", "..", "a/b"] {
        let err = app
            .runtime
            .nodes
            .make_dir(&alice, root.id, name)
            .await
            .expect_err("invalid name");
        assert_eq!(err.kind, ErrorKind::BadRequest, "name {name:?}");
    }
}

#[tokio::test]
async fn test_copy_onto_existing_name_conflicts() {
    let app = TestApp::new().await;
    let nodes = &app.runtime.nodes;
    let (_, root, alice) = app.create_user("alice", false).await;

    let docs = app.mkdir(&alice, &root, "docs").await;
    let file = app.new_file(&alice, &docs, "b.txt", b"hello").await;
    app.new_file(&alice, &root, "b.txt", b"other").await;

    let err = nodes
        .copy(&alice, file.id, root.id, "b.txt")
        .await
        .expect_err("collision");
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(child_names(&app, &alice, &root).await, vec!["b.txt", "docs"]);
}

#[tokio::test]
async fn test_recursive_delete_is_exhaustive() {
    let app = TestApp::new().await;
    let nodes = &app.runtime.nodes;
    let (_, root, alice) = app.create_user("alice", false).await;

    let top = app.mkdir(&alice, &root, "top").await;
    let sub = app.mkdir(&alice, &top, "sub").await;
    let deeper = app.mkdir(&alice, &sub, "deeper").await;
    let mut descendants = vec![sub.id, deeper.id];
    for (parent, name) in [(&top, "1.txt"), (&sub, "2.txt"), (&deeper, "3.txt")] {
        descendants.push(app.new_file(&alice, parent, name, b"data").await.id);
    }

    let deleted = nodes.delete(&alice, top.id, true).await.expect("delete");
    assert_eq!(deleted.len(), descendants.len() + 1);
    assert_eq!(deleted.last().map(|n| n.id), Some(top.id));

    for id in descendants.into_iter().chain(std::iter::once(top.id)) {
        let err = nodes.get(&alice, id).await.expect_err("deleted");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
    assert!(child_names(&app, &alice, &root).await.is_empty());
}

#[tokio::test]
async fn test_copy_produces_isomorphic_subtree() {
    let app = TestApp::new().await;
    let nodes = &app.runtime.nodes;
    let (_, root, alice) = app.create_user("alice", false).await;

    let src = app.mkdir(&alice, &root, "src").await;
    app.new_file(&alice, &src, "f1.txt", b"one").await;
    app.new_file(&alice, &src, "f2.txt", b"two").await;
    let s = app.mkdir(&alice, &src, "s").await;
    app.new_file(&alice, &s, "f3.txt", b"three").await;
    let dest = app.mkdir(&alice, &root, "dest").await;

    let created = nodes
        .copy(&alice, src.id, dest.id, "copy")
        .await
        .expect("copy");
    let order: Vec<&str> = created.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(order, vec!["copy", "f1.txt", "f2.txt", "s", "f3.txt"]);

    let copy = nodes
        .resolve(&alice, root.id, "/dest/copy")
        .await
        .expect("resolve")
        .expect("copy exists");
    assert_ne!(copy.id, src.id);
    assert_eq!(
        child_names(&app, &alice, &copy).await,
        child_names(&app, &alice, &src).await
    );

    let copied_s = nodes
        .resolve(&alice, root.id, "/dest/copy/s")
        .await
        .expect("resolve")
        .expect("s copied");
    assert_eq!(child_names(&app, &alice, &copied_s).await, vec!["f3.txt"]);

    let f3 = nodes
        .resolve(&alice, root.id, "/dest/copy/s/f3.txt")
        .await
        .expect("resolve")
        .expect("f3 copied");
    let bytes = std::fs::read(app.runtime.layout.content_path(f3.id)).expect("copied bytes");
    assert_eq!(bytes, b"three");
}

#[tokio::test]
async fn test_copy_duplicates_thumbnail() {
    let app = TestApp::new().await;
    let nodes = &app.runtime.nodes;
    let layout = &app.runtime.layout;
    let (_, root, alice) = app.create_user("alice", false).await;

    let pic = app.new_file(&alice, &root, "p.png", PNG_BYTES).await;
    app.runtime.processor.drain().await.expect("drain");
    let pic = nodes.get(&alice, pic.id).await.expect("pic");
    assert!(pic.has_custom_thumb);

    let created = nodes
        .copy(&alice, pic.id, root.id, "dup.png")
        .await
        .expect("copy");
    assert_eq!(created.len(), 1);
    let dup = &created[0];
    assert_ne!(dup.id, pic.id);
    assert!(dup.has_custom_thumb);
    assert_eq!(
        std::fs::read(layout.thumb_path(dup.id)).expect("copied thumb"),
        std::fs::read(layout.thumb_path(pic.id)).expect("thumb")
    );
    assert_eq!(
        std::fs::read(layout.content_path(dup.id)).expect("copied content"),
        PNG_BYTES
    );
}

#[tokio::test]
async fn test_rename_onto_sibling_conflicts() {
    let app = TestApp::new().await;
    let nodes = &app.runtime.nodes;
    let (_, root, alice) = app.create_user("alice", false).await;

    let a = app.new_file(&alice, &root, "a.txt", b"a").await;
    app.mkdir(&alice, &root, "b").await;

    let err = nodes.rename(&alice, a.id, "b").await.expect_err("taken");
    assert_eq!(err.kind, ErrorKind::Conflict);
    let err = nodes.rename(&alice, a.id, "../a.txt").await.expect_err("invalid");
    assert_eq!(err.kind, ErrorKind::BadRequest);

    nodes.rename(&alice, a.id, "a.txt").await.expect("same name");
    assert_eq!(child_names(&app, &alice, &root).await, vec!["a.txt", "b"]);
}

#[tokio::test]
async fn test_copy_into_own_subtree_is_rejected() {
    let app = TestApp::new().await;
    let nodes = &app.runtime.nodes;
    let (_, root, alice) = app.create_user("alice", false).await;

    let a = app.mkdir(&alice, &root, "a").await;
    let b = app.mkdir(&alice, &a, "b").await;

    let err = nodes.copy(&alice, a.id, b.id, "a").await.expect_err("into self");
    assert_eq!(err.kind, ErrorKind::BadRequest);
    let err = nodes.move_node(&alice, a.id, b.id).await.expect_err("into self");
    assert_eq!(err.kind, ErrorKind::BadRequest);
}

#[tokio::test]
async fn test_path_round_trip() {
    let app = TestApp::new().await;
    let nodes = &app.runtime.nodes;
    let (_, root, alice) = app.create_user("alice", false).await;

    let photos = app.mkdir(&alice, &root, "photos").await;
    let year = app.mkdir(&alice, &photos, "2024").await;
    app.new_file(&alice, &year, "beach.jpg", b"not really a jpeg").await;

    for raw in ["/", "photos", "//photos/./2024/", "/photos/2024/beach.jpg"] {
        let node = nodes
            .resolve(&alice, root.id, raw)
            .await
            .expect("resolve")
            .expect("exists");
        let logical = nodes.logical_path(&alice, node.id).await.expect("path");
        assert_eq!(logical, homevault_service::node::path::normalize(raw));
    }

    let missing = nodes
        .resolve(&alice, root.id, "/photos/2025/beach.jpg")
        .await
        .expect("resolve");
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_physical_path_depends_only_on_id() {
    let app = TestApp::new().await;
    let nodes = &app.runtime.nodes;
    let (_, root, alice) = app.create_user("alice", false).await;

    let inbox = app.mkdir(&alice, &root, "inbox").await;
    let archive = app.mkdir(&alice, &root, "archive").await;
    let file = app.new_file(&alice, &inbox, "report.txt", b"quarterly").await;
    let before = app.runtime.layout.content_path(file.id);

    nodes.rename(&alice, file.id, "final.txt").await.expect("rename");
    let moved = nodes.move_node(&alice, file.id, archive.id).await.expect("move");
    assert_eq!(moved.parent_id, Some(archive.id));

    assert_eq!(app.runtime.layout.content_path(moved.id), before);
    assert_eq!(std::fs::read(&before).expect("content"), b"quarterly");
    assert_eq!(
        nodes.logical_path(&alice, moved.id).await.expect("path"),
        "/archive/final.txt"
    );
}

#[tokio::test]
async fn test_replace_file_updates_metadata_in_place() {
    let app = TestApp::new().await;
    let nodes = &app.runtime.nodes;
    let (_, root, alice) = app.create_user("alice", false).await;

    let file = app.new_file(&alice, &root, "notes.txt", b"v1").await;
    assert_eq!(app.runtime.queue.pending_count().await.expect("count"), 1);

    let upload = app.write_upload("notes-v2.txt", b"second version");
    let replaced = nodes
        .replace_file(&alice, file.id, &upload, IngestMode::Copy, false)
        .await
        .expect("replace");
    assert_eq!(replaced.id, file.id);
    assert_eq!(replaced.name, "notes.txt");
    assert_eq!(replaced.parent_id, Some(root.id));
    assert_eq!(replaced.size, b"second version".len() as i64);
    assert_eq!(
        std::fs::read(app.runtime.layout.content_path(file.id)).expect("content"),
        b"second version"
    );
    assert_eq!(app.runtime.queue.pending_count().await.expect("count"), 2);

    let dir = app.mkdir(&alice, &root, "docs").await;
    let err = nodes
        .replace_file(&alice, dir.id, &upload, IngestMode::Copy, false)
        .await
        .expect_err("directory");
    assert_eq!(err.kind, ErrorKind::BadRequest);
}

#[tokio::test]
async fn test_move_checks_siblings_and_ownership() {
    let app = TestApp::new().await;
    let nodes = &app.runtime.nodes;
    let (_, root, alice) = app.create_user("alice", false).await;
    let (_, bob_root, bob) = app.create_user("bob", false).await;

    let a = app.mkdir(&alice, &root, "a").await;
    let file = app.new_file(&alice, &a, "same.txt", b"1").await;
    app.new_file(&alice, &root, "same.txt", b"2").await;

    let err = nodes.move_node(&alice, file.id, root.id).await.expect_err("sibling");
    assert_eq!(err.kind, ErrorKind::Conflict);

    let err = nodes
        .move_node(&alice, file.id, bob_root.id)
        .await
        .expect_err("other owner");
    assert_eq!(err.kind, ErrorKind::Unauthorized);

    let err = nodes.get(&bob, file.id).await.expect_err("not bob's");
    assert_eq!(err.kind, ErrorKind::Unauthorized);
}

#[tokio::test]
async fn test_roots_cannot_be_deleted_or_moved() {
    let app = TestApp::new().await;
    let nodes = &app.runtime.nodes;
    let (_, root, alice) = app.create_user("alice", false).await;
    let dir = app.mkdir(&alice, &root, "dir").await;

    let err = nodes.delete(&alice, root.id, true).await.expect_err("root");
    assert_eq!(err.kind, ErrorKind::BadRequest);
    let err = nodes.move_node(&alice, root.id, dir.id).await.expect_err("root");
    assert_eq!(err.kind, ErrorKind::BadRequest);
}

#[tokio::test]
async fn test_admin_may_act_on_any_tree() {
    let app = TestApp::new().await;
    let (_, root, alice) = app.create_user("alice", false).await;
    let (_, _, admin) = app.create_user("admin", true).await;
    app.new_file(&alice, &root, "note.txt", b"hi").await;

    let listing = app
        .runtime
        .nodes
        .list_dir(&admin, root.id)
        .await
        .expect("admin listing");
    assert_eq!(listing.path, "/");
    assert_eq!(listing.children.len(), 1);
}

#[tokio::test]
async fn test_list_dir_carries_viewer_progress() {
    let app = TestApp::new().await;
    let nodes = &app.runtime.nodes;
    let (_, root, alice) = app.create_user("alice", false).await;
    let music = app.mkdir(&alice, &root, "music").await;
    let song = app.new_file(&alice, &music, "song.mp3", helpers::MP3_BYTES).await;
    app.new_file(&alice, &music, "other.mp3", helpers::MP3_BYTES).await;

    nodes
        .update_progress(&alice, song.id, 0.5, 31.0)
        .await
        .expect("progress");
    let err = nodes
        .update_progress(&alice, song.id, 1.5, 31.0)
        .await
        .expect_err("volume out of range");
    assert_eq!(err.kind, ErrorKind::BadRequest);

    let listing = nodes.list_dir(&alice, music.id).await.expect("listing");
    assert_eq!(listing.path, "/music");
    let with_progress: Vec<&str> = listing
        .children
        .iter()
        .filter(|c| c.progress.is_some())
        .map(|c| c.node.name.as_str())
        .collect();
    assert_eq!(with_progress, vec!["song.mp3"]);

    let err = nodes
        .set_meta(&alice, song.id, "rating", &serde_json::json!(5))
        .await
        .expect_err("unsupported meta type");
    assert_eq!(err.kind, ErrorKind::BadRequest);
    nodes
        .set_meta(&alice, song.id, "progress", &serde_json::json!({"t": 31}))
        .await
        .expect("meta");
    assert_eq!(nodes.meta(&alice, song.id).await.expect("meta").len(), 1);
}

#[tokio::test]
async fn test_search_matches_all_terms() {
    let app = TestApp::new().await;
    let (_, root, alice) = app.create_user("alice", false).await;
    let (_, bob_root, bob) = app.create_user("bob", false).await;
    app.new_file(&alice, &root, "Summer Holiday.txt", b"x").await;
    app.new_file(&alice, &root, "summer.txt", b"x").await;
    app.new_file(&bob, &bob_root, "summer holiday bob.txt", b"x").await;

    let found = app
        .runtime
        .nodes
        .search(&alice, "holiday SUMMER")
        .await
        .expect("search");
    let names: Vec<&str> = found.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Summer Holiday.txt"]);
}

#[tokio::test]
async fn test_find_or_create_provisions_root_once() {
    let app = TestApp::new().await;
    let users = &app.runtime.users;

    let (user, root) = users.find_or_create("carol").await.expect("first");
    let (again, same_root) = users.find_or_create("carol").await.expect("second");
    assert_eq!(user.id, again.id);
    assert_eq!(root.id, same_root.id);
    assert_eq!(again.root_id, Some(root.id));
    assert!(app.runtime.layout.home_dir("carol").is_dir());
}
