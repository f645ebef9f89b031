//! Transactional façade over the mutation engine.
//!
//! Each method opens one write transaction, runs the engine, performs the
//! physical placement that must succeed before commit, commits, and only
//! then wakes the processing queue.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use homevault_core::config::IngestMode;
use homevault_core::error::AppError;
use homevault_core::result::AppResult;
use homevault_core::traits::MimeDetector;
use homevault_core::types::NodeId;
use homevault_database::DatabasePool;
use homevault_database::repositories::node as node_repo;
use homevault_entity::node::Node;
use homevault_storage::{StorageLayout, local};

use super::access::require_access;
use super::mutation::MutationEngine;
use super::path;
use crate::context::Actor;
use crate::processing::ProcessingQueue;

/// Node operations for request handlers, the CLI, and reconciliation.
#[derive(Debug, Clone)]
pub struct NodeService {
    pub(crate) db: DatabasePool,
    pub(crate) engine: MutationEngine,
    queue: ProcessingQueue,
    mime: Arc<dyn MimeDetector>,
}

impl NodeService {
    /// Creates a new node service.
    pub fn new(
        db: DatabasePool,
        engine: MutationEngine,
        queue: ProcessingQueue,
        mime: Arc<dyn MimeDetector>,
    ) -> Self {
        Self {
            db,
            engine,
            queue,
            mime,
        }
    }

    /// The underlying mutation engine.
    pub fn engine(&self) -> &MutationEngine {
        &self.engine
    }

    /// The physical layout.
    pub fn layout(&self) -> &StorageLayout {
        self.engine.layout()
    }

    /// The processing queue new files are enqueued on.
    pub fn queue(&self) -> &ProcessingQueue {
        &self.queue
    }

    /// The MIME detector used for new content.
    pub fn mime_detector(&self) -> &Arc<dyn MimeDetector> {
        &self.mime
    }

    /// Load a node the actor may access.
    pub async fn get(&self, actor: &Actor, id: NodeId) -> AppResult<Node> {
        let mut conn = self.db.acquire().await?;
        let node = node_repo::get(&mut conn, id).await?;
        require_access(actor, &node)?;
        Ok(node)
    }

    /// Direct children of a directory, in catalog order.
    pub async fn children(&self, actor: &Actor, dir_id: NodeId) -> AppResult<Vec<Node>> {
        let mut conn = self.db.acquire().await?;
        let dir = node_repo::get(&mut conn, dir_id).await?;
        require_access(actor, &dir)?;
        node_repo::children(&mut conn, dir.id).await
    }

    /// Logical path of a node, e.g. `/docs/a.txt`.
    pub async fn logical_path(&self, actor: &Actor, id: NodeId) -> AppResult<String> {
        let mut conn = self.db.acquire().await?;
        let node = node_repo::get(&mut conn, id).await?;
        require_access(actor, &node)?;
        path::logical_path_of(&mut conn, &node).await
    }

    /// Resolve a logical path below `root_id`. `None` when any segment is
    /// missing.
    pub async fn resolve(
        &self,
        actor: &Actor,
        root_id: NodeId,
        logical_path: &str,
    ) -> AppResult<Option<Node>> {
        let mut conn = self.db.acquire().await?;
        let root = node_repo::get(&mut conn, root_id).await?;
        require_access(actor, &root)?;
        path::resolve(&mut conn, &root, logical_path).await
    }

    /// Create a directory.
    pub async fn make_dir(&self, actor: &Actor, parent_id: NodeId, name: &str) -> AppResult<Node> {
        let mut tx = self.db.begin_write().await?;
        let parent = node_repo::get(&mut tx, parent_id).await?;
        let node = self.engine.make_dir(&mut tx, actor, &parent, name).await?;
        tx.commit().await?;
        Ok(node)
    }

    /// Create a file from the bytes at `source` and enqueue it for
    /// processing.
    ///
    /// With `delete_source` the source is an upload that the processor
    /// removes afterwards, so content is always copied rather than linked.
    pub async fn create_file(
        &self,
        actor: &Actor,
        parent_id: NodeId,
        name: &str,
        source: &Path,
        mode: IngestMode,
        delete_source: bool,
    ) -> AppResult<Node> {
        let size = local::file_size(source).await?;
        let mime_type = self.mime.detect(source).await?;
        let mode = if delete_source { IngestMode::Copy } else { mode };

        let mut tx = self.db.begin_write().await?;
        let parent = node_repo::get(&mut tx, parent_id).await?;
        let node = self
            .engine
            .new_file(&mut tx, actor, &parent, name, &mime_type, size, None)
            .await?;

        self.place_content(&node, source, mode).await?;
        self.queue
            .enqueue_in(&mut tx, node.id, source, delete_source)
            .await?;
        tx.commit().await?;
        self.queue.notify();

        info!(node_id = %node.id, name, mime_type, size, "Created file");
        Ok(node)
    }

    /// Replace a file's content with the bytes at `source`.
    pub async fn replace_file(
        &self,
        actor: &Actor,
        node_id: NodeId,
        source: &Path,
        mode: IngestMode,
        delete_source: bool,
    ) -> AppResult<Node> {
        let size = local::file_size(source).await?;
        let mime_type = self.mime.detect(source).await?;
        let mode = if delete_source { IngestMode::Copy } else { mode };

        let mut tx = self.db.begin_write().await?;
        let node = node_repo::get(&mut tx, node_id).await?;
        let node = self
            .engine
            .update_file(&mut tx, actor, &node, &mime_type, size, None)
            .await?;

        self.place_content(&node, source, mode).await?;
        self.queue
            .enqueue_in(&mut tx, node.id, source, delete_source)
            .await?;
        tx.commit().await?;
        self.queue.notify();

        info!(node_id = %node.id, mime_type, size, "Replaced file content");
        Ok(node)
    }

    /// Put content for `node` in the file store, cleaning up on failure.
    pub async fn place_content(
        &self,
        node: &Node,
        source: &Path,
        mode: IngestMode,
    ) -> AppResult<()> {
        let dest = self.layout().content_path(node.id);
        if let Err(e) = local::place(source, &dest, mode).await {
            if let Err(cleanup) = local::remove_quietly(&dest).await {
                warn!(node_id = %node.id, error = %cleanup, "Failed to remove partial content");
            }
            return Err(AppError::with_source(
                e.kind,
                format!("Failed to store content of node {}", node.id),
                e,
            ));
        }
        Ok(())
    }

    /// Copy a node (recursively for directories) into `dest_id`.
    pub async fn copy(
        &self,
        actor: &Actor,
        src_id: NodeId,
        dest_id: NodeId,
        new_name: &str,
    ) -> AppResult<Vec<Node>> {
        let mut tx = self.db.begin_write().await?;
        let src = node_repo::get(&mut tx, src_id).await?;
        let dest = node_repo::get(&mut tx, dest_id).await?;
        let created = self
            .engine
            .copy(&mut tx, actor, &src, &dest, new_name)
            .await?;
        tx.commit().await?;
        Ok(created)
    }

    /// Move a node under `dest_id`.
    pub async fn move_node(&self, actor: &Actor, id: NodeId, dest_id: NodeId) -> AppResult<Node> {
        let mut tx = self.db.begin_write().await?;
        let node = node_repo::get(&mut tx, id).await?;
        let dest = node_repo::get(&mut tx, dest_id).await?;
        let moved = self.engine.move_node(&mut tx, actor, &node, &dest).await?;
        tx.commit().await?;
        Ok(moved)
    }

    /// Rename a node.
    pub async fn rename(&self, actor: &Actor, id: NodeId, new_name: &str) -> AppResult<Node> {
        let mut tx = self.db.begin_write().await?;
        let node = node_repo::get(&mut tx, id).await?;
        let renamed = self.engine.rename(&mut tx, actor, &node, new_name).await?;
        tx.commit().await?;
        Ok(renamed)
    }

    /// Delete a node; see [`MutationEngine::delete`].
    pub async fn delete(&self, actor: &Actor, id: NodeId, recursive: bool) -> AppResult<Vec<Node>> {
        let mut tx = self.db.begin_write().await?;
        let node = node_repo::get(&mut tx, id).await?;
        let deleted = self.engine.delete(&mut tx, actor, &node, recursive).await?;
        tx.commit().await?;
        info!(node_id = %id, deleted = deleted.len(), recursive, "Deleted node");
        Ok(deleted)
    }
}
