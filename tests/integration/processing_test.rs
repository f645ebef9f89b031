//! Integration tests for the processing queue and the node processor.

mod helpers;

use std::time::Duration;

use homevault_core::config::IngestMode;
use homevault_core::types::NodeId;
use homevault_database::repositories::processing as processing_repo;
use homevault_entity::processing::NewProcessingRequest;
use homevault_worker::jobs::regenerate_thumbnails;

use helpers::{MP3_BYTES, MP4_BYTES, PNG_BYTES, TestApp};

#[tokio::test]
async fn test_new_files_are_enqueued_and_processed() {
    let mut app = TestApp::new().await;
    let (_, root, alice) = app.create_user("alice", false).await;

    let image = app.new_file(&alice, &root, "pic.png", PNG_BYTES).await;
    let video = app.new_file(&alice, &root, "clip.mp4", MP4_BYTES).await;
    let song = app.new_file(&alice, &root, "song.mp3", MP3_BYTES).await;
    let text = app.new_file(&alice, &root, "notes.txt", b"plain").await;
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(video.mime_type, "video/mp4");
    assert_eq!(song.mime_type, "audio/mpeg");
    assert_eq!(app.runtime.queue.pending_count().await.expect("count"), 4);

    app.run_processor().await;
    assert_eq!(app.runtime.queue.pending_count().await.expect("count"), 0);

    let nodes = &app.runtime.nodes;
    let image = nodes.get(&alice, image.id).await.expect("image");
    assert!(image.has_custom_thumb);
    assert_eq!(image.length, None);
    assert!(app.runtime.layout.thumb_path(image.id).exists());

    let video = nodes.get(&alice, video.id).await.expect("video");
    assert!(video.has_custom_thumb);
    assert_eq!(video.length, Some(42.5));

    let song = nodes.get(&alice, song.id).await.expect("song");
    assert!(!song.has_custom_thumb);
    assert_eq!(song.length, Some(42.5));

    let text = nodes.get(&alice, text.id).await.expect("text");
    assert!(!text.has_custom_thumb);
    assert_eq!(text.length, None);

    assert_eq!(app.toolkit.probe_calls(), 2);
    assert_eq!(app.toolkit.thumbnail_calls(), 2);
}

#[tokio::test]
async fn test_leftover_requests_are_drained_on_start() {
    let mut app = TestApp::new().await;
    let (_, root, alice) = app.create_user("alice", false).await;
    let image = app.new_file(&alice, &root, "pic.png", PNG_BYTES).await;
    // Drop the wake-up so only the persisted row remains, as after a restart.
    let taken = app.runtime.queue.take().await.expect("take").expect("request");

    {
        let mut tx = app.runtime.db.begin_write().await.expect("tx");
        processing_repo::insert(
            &mut tx,
            &NewProcessingRequest {
                node_id: image.id,
                source_path: taken.source_path.clone(),
                delete_source: false,
            },
        )
        .await
        .expect("insert leftover");
        tx.commit().await.expect("commit");
    }
    let mut signals = app.signals.take().expect("signals");
    while signals.try_recv().is_ok() {}

    let handle = tokio::spawn(app.runtime.processor.clone().run(signals));
    app.runtime.queue.stop().await;
    handle.await.expect("processor");

    assert_eq!(app.runtime.queue.pending_count().await.expect("count"), 0);
    let image = app.runtime.nodes.get(&alice, image.id).await.expect("image");
    assert!(image.has_custom_thumb);
}

#[tokio::test]
async fn test_stop_waits_for_in_flight_requests() {
    let mut app = TestApp::new().await;
    let (_, root, alice) = app.create_user("alice", false).await;
    app.toolkit.set_thumbnail_delay(Duration::from_millis(300));
    let image = app.new_file(&alice, &root, "pic.png", PNG_BYTES).await;

    let signals = app.signals.take().expect("signals");
    let handle = tokio::spawn(app.runtime.processor.clone().run(signals));
    for _ in 0..500 {
        if app.toolkit.thumbnail_calls() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(app.toolkit.thumbnail_calls(), 1, "request claimed");

    app.runtime.queue.stop().await;
    handle.await.expect("processor");

    let image = app.runtime.nodes.get(&alice, image.id).await.expect("image");
    assert!(image.has_custom_thumb, "in-flight request finished before stop returned");
    assert!(app.runtime.layout.thumb_path(image.id).exists());
}

#[tokio::test]
async fn test_take_claims_oldest_exactly_once() {
    let app = TestApp::new().await;
    let (_, root, alice) = app.create_user("alice", false).await;
    let first = app.new_file(&alice, &root, "1.txt", b"1").await;
    let second = app.new_file(&alice, &root, "2.txt", b"2").await;

    let queue = &app.runtime.queue;
    let (a, b) = tokio::join!(queue.take(), queue.take());
    let mut claimed: Vec<NodeId> = [a, b]
        .into_iter()
        .map(|r| r.expect("take").expect("request").node_id)
        .collect();
    claimed.sort();
    assert_eq!(claimed, vec![first.id, second.id]);
    assert!(queue.take().await.expect("take").is_none());
}

#[tokio::test]
async fn test_upload_source_is_removed_after_processing() {
    let mut app = TestApp::new().await;
    let (_, root, alice) = app.create_user("alice", false).await;
    app.toolkit.set_thumbnails_failing(true);

    let upload = app.write_upload("pic.png", PNG_BYTES);
    let node = app
        .runtime
        .nodes
        .create_file(&alice, root.id, "pic.png", &upload, IngestMode::Symlink, true)
        .await
        .expect("create");

    app.run_processor().await;

    assert!(!upload.exists(), "upload removed even though processing failed");
    let content = app.runtime.layout.content_path(node.id);
    assert!(!content.is_symlink(), "uploads are copied, never linked");
    assert_eq!(std::fs::read(content).expect("content"), PNG_BYTES);
}

#[tokio::test]
async fn test_deleted_node_is_skipped() {
    let app = TestApp::new().await;
    let (_, root, alice) = app.create_user("alice", false).await;

    let upload = app.write_upload("pic.png", PNG_BYTES);
    let node = app
        .runtime
        .nodes
        .create_file(&alice, root.id, "pic.png", &upload, IngestMode::Copy, true)
        .await
        .expect("create");
    app.runtime
        .nodes
        .delete(&alice, node.id, false)
        .await
        .expect("delete");

    let outcome = app
        .runtime
        .processor
        .process_next()
        .await
        .expect("process")
        .expect("one request");
    assert_eq!(outcome.node_id, None);
    assert!(!outcome.thumbnail);
    assert!(outcome.source_removed);
    assert!(!upload.exists());
    assert_eq!(app.toolkit.thumbnail_calls(), 0);
}

#[tokio::test]
async fn test_failures_are_not_requeued_until_regenerated() {
    let app = TestApp::new().await;
    let (_, root, alice) = app.create_user("alice", false).await;
    let runtime = &app.runtime;

    app.toolkit.set_thumbnails_failing(true);
    app.toolkit.set_probe_failing(true);
    let image = app.new_file(&alice, &root, "pic.png", PNG_BYTES).await;
    let video = app.new_file(&alice, &root, "clip.mp4", MP4_BYTES).await;

    assert_eq!(runtime.processor.drain().await.expect("drain"), 2);
    assert_eq!(runtime.queue.pending_count().await.expect("count"), 0);
    let video_node = runtime.nodes.get(&alice, video.id).await.expect("video");
    assert!(!video_node.has_custom_thumb);
    assert_eq!(video_node.length, None);

    app.toolkit.set_thumbnails_failing(false);
    app.toolkit.set_probe_failing(false);
    let enqueued = regenerate_thumbnails(&runtime.db, &runtime.queue, &runtime.layout, true)
        .await
        .expect("regenerate");
    assert_eq!(enqueued, 2);
    assert_eq!(runtime.processor.drain().await.expect("drain"), 2);

    for id in [image.id, video.id] {
        assert!(runtime.nodes.get(&alice, id).await.expect("node").has_custom_thumb);
    }

    let enqueued = regenerate_thumbnails(&runtime.db, &runtime.queue, &runtime.layout, true)
        .await
        .expect("regenerate missing");
    assert_eq!(enqueued, 0);
    let enqueued = regenerate_thumbnails(&runtime.db, &runtime.queue, &runtime.layout, false)
        .await
        .expect("regenerate all");
    assert_eq!(enqueued, 2);
}
