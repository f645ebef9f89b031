//! Read model with per-viewer extras, metadata, progress, and search.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use homevault_core::error::AppError;
use homevault_core::result::AppResult;
use homevault_core::types::NodeId;
use homevault_database::repositories::{extras as extras_repo, node as node_repo};
use homevault_entity::node::{META_TYPE_PROGRESS, Node, NodeMeta, NodeWithExtras, ViewProgress};

use super::access::{can_access, require_access};
use super::mutation::require_dir;
use super::path;
use super::service::NodeService;
use crate::context::Actor;

/// A directory, its logical path, and its children as seen by one viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryListing {
    pub directory: NodeWithExtras,
    pub path: String,
    pub children: Vec<NodeWithExtras>,
}

impl NodeService {
    /// One node with the actor's progress on it.
    pub async fn node_with_extras(&self, actor: &Actor, id: NodeId) -> AppResult<NodeWithExtras> {
        let mut conn = self.db.acquire().await?;
        let node = node_repo::get(&mut conn, id).await?;
        require_access(actor, &node)?;
        let progress = extras_repo::progress_for(&mut conn, node.id, actor.user_id).await?;
        Ok(NodeWithExtras { node, progress })
    }

    /// A directory with its children and the actor's extras.
    pub async fn list_dir(&self, actor: &Actor, dir_id: NodeId) -> AppResult<DirectoryListing> {
        let mut conn = self.db.acquire().await?;
        let dir = node_repo::get(&mut conn, dir_id).await?;
        require_access(actor, &dir)?;
        require_dir(&dir)?;

        let path = path::logical_path_of(&mut conn, &dir).await?;
        let progress = extras_repo::progress_for(&mut conn, dir.id, actor.user_id).await?;
        let mut by_node: HashMap<NodeId, ViewProgress> =
            extras_repo::progress_for_children(&mut conn, dir.id, actor.user_id)
                .await?
                .into_iter()
                .map(|p| (p.node_id, p))
                .collect();

        let children = node_repo::children(&mut conn, dir.id)
            .await?
            .into_iter()
            .map(|node| {
                let progress = by_node.remove(&node.id);
                NodeWithExtras { node, progress }
            })
            .collect();

        Ok(DirectoryListing {
            directory: NodeWithExtras {
                node: dir,
                progress,
            },
            path,
            children,
        })
    }

    /// Record the actor's playback position and volume on a node.
    pub async fn update_progress(
        &self,
        actor: &Actor,
        id: NodeId,
        volume: f64,
        progress: f64,
    ) -> AppResult<ViewProgress> {
        if !(0.0..=1.0).contains(&volume) || progress < 0.0 {
            return Err(AppError::bad_request("Volume must be in [0, 1] and progress >= 0"));
        }

        let mut tx = self.db.begin_write().await?;
        let node = node_repo::get(&mut tx, id).await?;
        require_access(actor, &node)?;
        let saved =
            extras_repo::upsert_progress(&mut tx, node.id, actor.user_id, volume, progress).await?;
        tx.commit().await?;
        Ok(saved)
    }

    /// Attach typed JSON metadata to a node for the actor.
    pub async fn set_meta(
        &self,
        actor: &Actor,
        id: NodeId,
        meta_type: &str,
        data: &serde_json::Value,
    ) -> AppResult<NodeMeta> {
        if meta_type != META_TYPE_PROGRESS {
            return Err(AppError::bad_request(format!(
                "Unsupported metadata type '{meta_type}'"
            )));
        }

        let mut tx = self.db.begin_write().await?;
        let node = node_repo::get(&mut tx, id).await?;
        require_access(actor, &node)?;
        let meta = extras_repo::upsert_meta(&mut tx, node.id, actor.user_id, meta_type, data).await?;
        tx.commit().await?;
        Ok(meta)
    }

    /// All metadata the actor attached to a node.
    pub async fn meta(&self, actor: &Actor, id: NodeId) -> AppResult<Vec<NodeMeta>> {
        let mut conn = self.db.acquire().await?;
        let node = node_repo::get(&mut conn, id).await?;
        require_access(actor, &node)?;
        extras_repo::meta_for(&mut conn, node.id, actor.user_id).await
    }

    /// The actor's nodes whose names contain every whitespace-separated
    /// term, case-insensitively, ordered by name.
    pub async fn search(&self, actor: &Actor, text: &str) -> AppResult<Vec<Node>> {
        let terms: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.db.acquire().await?;
        let found = node_repo::search(&mut conn, actor.user_id, &terms).await?;
        Ok(found.into_iter().filter(|n| can_access(actor, n)).collect())
    }
}
