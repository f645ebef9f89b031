//! Delete of files and directory subtrees.

use futures::future::BoxFuture;
use tracing::debug;

use homevault_core::error::AppError;
use homevault_core::result::AppResult;
use homevault_database::SqliteConnection;
use homevault_database::repositories::node as node_repo;
use homevault_entity::node::Node;
use homevault_storage::local;

use super::MutationEngine;
use crate::context::Actor;
use crate::node::access::require_access;

impl MutationEngine {
    /// Delete `node`, and with `recursive` everything beneath it.
    ///
    /// A non-empty directory without `recursive` fails `BadRequest`. Children
    /// go first, depth-first, and the returned list ends with `node` itself.
    /// Content and thumbnail removal is best-effort; the catalog row is
    /// deleted last.
    pub async fn delete(
        &self,
        conn: &mut SqliteConnection,
        actor: &Actor,
        node: &Node,
        recursive: bool,
    ) -> AppResult<Vec<Node>> {
        require_access(actor, node)?;
        if node.is_root() {
            return Err(AppError::bad_request(format!(
                "Root directory {} cannot be deleted",
                node.id
            )));
        }

        let deleted = self.delete_subtree(conn, actor, node, recursive).await?;
        debug!(node_id = %node.id, deleted = deleted.len(), "Deleted subtree");
        Ok(deleted)
    }

    fn delete_subtree<'a>(
        &'a self,
        conn: &'a mut SqliteConnection,
        actor: &'a Actor,
        node: &'a Node,
        recursive: bool,
    ) -> BoxFuture<'a, AppResult<Vec<Node>>> {
        Box::pin(async move {
            let children = node_repo::children(&mut *conn, node.id).await?;
            if !children.is_empty() && !recursive {
                return Err(AppError::bad_request(format!(
                    "Directory {} ('{}') is not empty",
                    node.id, node.name
                )));
            }

            let mut deleted = Vec::new();
            for child in &children {
                require_access(actor, child)?;
                let mut sub = self
                    .delete_subtree(&mut *conn, actor, child, recursive)
                    .await?;
                deleted.append(&mut sub);
            }

            // Bytes go before the commit. If the commit then fails, the row
            // survives without content and scan-deleted prunes it.
            if node.is_file() {
                local::remove_best_effort(&self.layout.content_path(node.id), "content").await;
            }
            local::remove_best_effort(&self.layout.thumb_path(node.id), "thumbnail").await;

            if !node_repo::delete(&mut *conn, node.id).await? {
                return Err(AppError::not_found(format!("Node {} not found", node.id)));
            }
            deleted.push(node.clone());
            Ok(deleted)
        })
    }
}
