//! Move and Rename. Both touch only the catalog: physical paths are keyed
//! by node ID.

use tracing::debug;

use homevault_core::error::AppError;
use homevault_core::result::AppResult;
use homevault_database::SqliteConnection;
use homevault_database::repositories::node as node_repo;
use homevault_entity::node::Node;

use super::{MutationEngine, require_dir, require_free_name};
use crate::context::Actor;
use crate::node::access::require_access;
use crate::node::naming::validate_name;
use crate::node::path;

impl MutationEngine {
    /// Re-parent `node` under `dest_parent`, keeping its name.
    pub async fn move_node(
        &self,
        conn: &mut SqliteConnection,
        actor: &Actor,
        node: &Node,
        dest_parent: &Node,
    ) -> AppResult<Node> {
        require_access(actor, node)?;
        require_access(actor, dest_parent)?;
        require_dir(dest_parent)?;

        if node.is_root() {
            return Err(AppError::bad_request(format!(
                "Root directory {} cannot be moved",
                node.id
            )));
        }
        if node.parent_id == Some(dest_parent.id) {
            return Ok(node.clone());
        }
        if dest_parent.owner_id != node.owner_id {
            return Err(AppError::unauthorized(format!(
                "Cannot move node {} into directory {} owned by another user",
                node.id, dest_parent.id
            )));
        }
        if node.is_dir() && path::is_within(&mut *conn, dest_parent, node.id).await? {
            return Err(AppError::bad_request(format!(
                "Cannot move directory {} into itself",
                node.id
            )));
        }
        require_free_name(&mut *conn, dest_parent.id, &node.name).await?;

        let moved = node_repo::set_parent(conn, node.id, dest_parent.id).await?;
        debug!(node_id = %node.id, dest_id = %dest_parent.id, "Moved node");
        Ok(moved)
    }

    /// Give `node` a new name within its current parent.
    pub async fn rename(
        &self,
        conn: &mut SqliteConnection,
        actor: &Actor,
        node: &Node,
        new_name: &str,
    ) -> AppResult<Node> {
        require_access(actor, node)?;
        validate_name(new_name)?;

        if node.name == new_name {
            return Ok(node.clone());
        }
        if let Some(parent_id) = node.parent_id {
            require_free_name(&mut *conn, parent_id, new_name).await?;
        }

        let renamed = node_repo::rename(conn, node.id, new_name).await?;
        debug!(node_id = %node.id, from = %node.name, to = new_name, "Renamed node");
        Ok(renamed)
    }
}
