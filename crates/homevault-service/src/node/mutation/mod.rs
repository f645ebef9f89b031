//! Mutation engine.
//!
//! Every operation runs against a caller-supplied connection, normally a
//! [`WriteTransaction`](homevault_database::WriteTransaction), and checks
//! access and naming rules before any catalog write. Physical I/O that must
//! succeed (content copies) happens while the transaction is still open, so
//! a failure there rolls the catalog back too.

mod copy;
mod create;
mod delete;
mod relocate;

use homevault_core::error::AppError;
use homevault_core::result::AppResult;
use homevault_core::types::NodeId;
use homevault_database::SqliteConnection;
use homevault_database::repositories::node as node_repo;
use homevault_entity::node::Node;
use homevault_storage::StorageLayout;

/// Applies tree mutations to the catalog and the physical store.
#[derive(Debug, Clone)]
pub struct MutationEngine {
    layout: StorageLayout,
}

impl MutationEngine {
    /// Create an engine writing to `layout`.
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    /// The physical layout this engine writes to.
    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }
}

/// Fail with `BadRequest` unless `node` is a directory.
pub(crate) fn require_dir(node: &Node) -> AppResult<()> {
    if node.is_dir() {
        Ok(())
    } else {
        Err(AppError::bad_request(format!(
            "Node {} ('{}') is not a directory",
            node.id, node.name
        )))
    }
}

/// Fail with `Conflict` if `parent_id` already has a child named `name`.
pub(crate) async fn require_free_name(
    conn: &mut SqliteConnection,
    parent_id: NodeId,
    name: &str,
) -> AppResult<()> {
    if node_repo::find_child(conn, parent_id, name).await?.is_some() {
        return Err(AppError::conflict(format!(
            "A node named '{name}' already exists in directory {parent_id}"
        )));
    }
    Ok(())
}
