//! Ownership-based access control.

use homevault_core::error::AppError;
use homevault_core::result::AppResult;
use homevault_entity::node::Node;

use crate::context::Actor;

/// Whether `actor` may read or modify `node`.
///
/// Owners and administrators may; nobody else may. Read and write access
/// are not distinguished.
pub fn can_access(actor: &Actor, node: &Node) -> bool {
    actor.is_admin() || actor.user_id == node.owner_id
}

/// Fail with `Unauthorized` unless `actor` may act on `node`.
pub fn require_access(actor: &Actor, node: &Node) -> AppResult<()> {
    if can_access(actor, node) {
        Ok(())
    } else {
        Err(AppError::unauthorized(format!(
            "User '{}' may not access node {}",
            actor.username, node.id
        )))
    }
}
