//! Re-enqueue thumbnailable files for processing.
//!
//! Processing failures are never retried on their own; this sweep is the
//! recovery path.

use tracing::info;

use homevault_core::result::AppResult;
use homevault_core::types::media::thumbnailable_types;
use homevault_database::DatabasePool;
use homevault_database::repositories::node as node_repo;
use homevault_service::ProcessingQueue;
use homevault_storage::StorageLayout;

/// Enqueue every thumbnailable file node, or with `only_missing` only the
/// ones without a thumbnail. Returns how many requests were enqueued.
pub async fn regenerate_thumbnails(
    db: &DatabasePool,
    queue: &ProcessingQueue,
    layout: &StorageLayout,
    only_missing: bool,
) -> AppResult<usize> {
    let mut tx = db.begin_write().await?;
    let nodes = node_repo::files_with_mime(&mut tx, &thumbnailable_types(), only_missing).await?;
    for node in &nodes {
        queue
            .enqueue_in(&mut tx, node.id, &layout.content_path(node.id), false)
            .await?;
    }
    tx.commit().await?;

    if !nodes.is_empty() {
        queue.notify();
    }
    info!(enqueued = nodes.len(), only_missing, "Thumbnail regeneration enqueued");
    Ok(nodes.len())
}
