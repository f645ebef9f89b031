//! MakeDir, NewFile, UpdateFile, and root creation.

use tracing::{debug, warn};

use homevault_core::error::AppError;
use homevault_core::result::AppResult;
use homevault_core::types::media::DIRECTORY_TYPE;
use homevault_database::SqliteConnection;
use homevault_database::repositories::node as node_repo;
use homevault_entity::node::{NewNode, Node, NodeType};
use homevault_entity::user::User;
use homevault_storage::local;

use super::{MutationEngine, require_dir, require_free_name};
use crate::context::Actor;
use crate::node::access::require_access;
use crate::node::naming::validate_name;

impl MutationEngine {
    /// Create a directory named `name` under `parent`.
    ///
    /// The new node is owned by the parent's owner.
    pub async fn make_dir(
        &self,
        conn: &mut SqliteConnection,
        actor: &Actor,
        parent: &Node,
        name: &str,
    ) -> AppResult<Node> {
        require_access(actor, parent)?;
        validate_name(name)?;
        require_dir(parent)?;
        require_free_name(&mut *conn, parent.id, name).await?;

        let node = node_repo::insert(
            conn,
            &NewNode {
                parent_id: Some(parent.id),
                name: name.to_string(),
                node_type: NodeType::Directory,
                mime_type: DIRECTORY_TYPE.to_string(),
                size: 0,
                length: None,
                owner_id: parent.owner_id,
                has_custom_thumb: false,
            },
        )
        .await?;

        // The bucket is bookkeeping only; a failure here is not fatal.
        let bucket = self.layout.content_dir(node.id);
        if let Err(e) = local::ensure_dir(&bucket).await {
            warn!(node_id = %node.id, error = %e, "Failed to create content bucket");
        }

        debug!(node_id = %node.id, parent_id = %parent.id, name, "Created directory");
        Ok(node)
    }

    /// Create the root directory of `owner`. The root has no parent.
    pub async fn create_root(&self, conn: &mut SqliteConnection, owner: &User) -> AppResult<Node> {
        validate_name(&owner.name)?;
        let node = node_repo::insert(
            conn,
            &NewNode {
                parent_id: None,
                name: owner.name.clone(),
                node_type: NodeType::Directory,
                mime_type: DIRECTORY_TYPE.to_string(),
                size: 0,
                length: None,
                owner_id: owner.id,
                has_custom_thumb: false,
            },
        )
        .await?;
        debug!(node_id = %node.id, user = %owner.name, "Created root directory");
        Ok(node)
    }

    /// Insert a file node under `parent`.
    ///
    /// Only the catalog row is written; the caller places the content bytes
    /// at [`StorageLayout::content_path`](homevault_storage::StorageLayout::content_path)
    /// before committing.
    pub async fn new_file(
        &self,
        conn: &mut SqliteConnection,
        actor: &Actor,
        parent: &Node,
        name: &str,
        mime_type: &str,
        size: i64,
        length: Option<f64>,
    ) -> AppResult<Node> {
        require_access(actor, parent)?;
        validate_name(name)?;
        require_dir(parent)?;
        require_free_name(&mut *conn, parent.id, name).await?;

        let node = node_repo::insert(
            conn,
            &NewNode {
                parent_id: Some(parent.id),
                name: name.to_string(),
                node_type: NodeType::File,
                mime_type: mime_type.to_string(),
                size,
                length,
                owner_id: parent.owner_id,
                has_custom_thumb: false,
            },
        )
        .await?;

        debug!(node_id = %node.id, parent_id = %parent.id, name, mime_type, size, "Created file");
        Ok(node)
    }

    /// Replace a file's content metadata. Name and parent are unchanged.
    pub async fn update_file(
        &self,
        conn: &mut SqliteConnection,
        actor: &Actor,
        node: &Node,
        mime_type: &str,
        size: i64,
        length: Option<f64>,
    ) -> AppResult<Node> {
        require_access(actor, node)?;
        if !node.is_file() {
            return Err(AppError::bad_request(format!(
                "Node {} is not a file",
                node.id
            )));
        }

        let updated = node_repo::update_content(conn, node.id, mime_type, size, length).await?;
        debug!(node_id = %node.id, mime_type, size, "Updated file");
        Ok(updated)
    }
}
