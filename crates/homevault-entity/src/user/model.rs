//! User entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use homevault_core::types::{NodeId, UserId};

/// A user account. Only the fields the node tree needs are modelled here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Login name, also the name of the user's root node and home directory.
    pub name: String,
    /// Administrators may act on any node.
    pub admin: bool,
    /// Root directory node, created lazily.
    pub root_id: Option<NodeId>,
}

/// Data required to create a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub admin: bool,
}
