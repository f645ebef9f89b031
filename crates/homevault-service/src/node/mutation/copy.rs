//! Copy of files and directory subtrees.

use futures::future::BoxFuture;
use tracing::debug;

use homevault_core::error::AppError;
use homevault_core::result::AppResult;
use homevault_database::SqliteConnection;
use homevault_database::repositories::node as node_repo;
use homevault_entity::node::Node;
use homevault_storage::local;

use super::{MutationEngine, require_dir};
use crate::context::Actor;
use crate::node::access::require_access;
use crate::node::path;

impl MutationEngine {
    /// Copy `src` into `dest_parent` under `new_name`.
    ///
    /// Directories are copied recursively with their children's original
    /// names. Returns every created node in pre-order: the copy of `src`
    /// first, then each child's copy result in catalog order. A failure part
    /// way through is returned as-is; catalog inserts are undone by the
    /// enclosing transaction, bytes already written are left for
    /// reconciliation.
    pub async fn copy(
        &self,
        conn: &mut SqliteConnection,
        actor: &Actor,
        src: &Node,
        dest_parent: &Node,
        new_name: &str,
    ) -> AppResult<Vec<Node>> {
        require_access(actor, src)?;
        require_access(actor, dest_parent)?;
        require_dir(dest_parent)?;

        if dest_parent.owner_id != src.owner_id {
            return Err(AppError::unauthorized(format!(
                "Cannot copy node {} into directory {} owned by another user",
                src.id, dest_parent.id
            )));
        }
        if src.is_dir() && path::is_within(&mut *conn, dest_parent, src.id).await? {
            return Err(AppError::bad_request(format!(
                "Cannot copy directory {} into itself",
                src.id
            )));
        }

        let created = self
            .copy_subtree(conn, actor, src, dest_parent, new_name)
            .await?;
        debug!(
            src_id = %src.id,
            dest_id = %dest_parent.id,
            created = created.len(),
            "Copied subtree"
        );
        Ok(created)
    }

    fn copy_subtree<'a>(
        &'a self,
        conn: &'a mut SqliteConnection,
        actor: &'a Actor,
        src: &'a Node,
        dest_parent: &'a Node,
        name: &'a str,
    ) -> BoxFuture<'a, AppResult<Vec<Node>>> {
        Box::pin(async move {
            if src.is_file() {
                let copy = self.copy_file(conn, actor, src, dest_parent, name).await?;
                return Ok(vec![copy]);
            }

            let dir = self.make_dir(&mut *conn, actor, dest_parent, name).await?;
            let children = node_repo::children(&mut *conn, src.id).await?;

            let mut created = vec![dir.clone()];
            for child in &children {
                let mut sub = self
                    .copy_subtree(&mut *conn, actor, child, &dir, &child.name)
                    .await?;
                created.append(&mut sub);
            }
            Ok(created)
        })
    }

    async fn copy_file(
        &self,
        conn: &mut SqliteConnection,
        actor: &Actor,
        src: &Node,
        dest_parent: &Node,
        name: &str,
    ) -> AppResult<Node> {
        let mut copy = self
            .new_file(
                &mut *conn,
                actor,
                dest_parent,
                name,
                &src.mime_type,
                src.size,
                src.length,
            )
            .await?;

        local::copy(
            &self.layout.content_path(src.id),
            &self.layout.content_path(copy.id),
        )
        .await?;

        if src.has_custom_thumb {
            local::copy(
                &self.layout.thumb_path(src.id),
                &self.layout.thumb_path(copy.id),
            )
            .await?;
            copy = node_repo::update_media(conn, copy.id, copy.length, true).await?;
        }

        Ok(copy)
    }
}
