//! The acting user passed into every engine call.

use serde::{Deserialize, Serialize};

use homevault_core::types::UserId;
use homevault_entity::user::User;

/// Who is performing an operation.
///
/// Supplied by the authentication layer and trusted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The authenticated user's ID.
    pub user_id: UserId,
    /// Login name, for logs.
    pub username: String,
    /// Administrators may act on any node.
    pub admin: bool,
}

impl Actor {
    /// Act as the given user.
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.name.clone(),
            admin: user.admin,
        }
    }

    /// Internal maintenance identity with administrator rights.
    pub fn system() -> Self {
        Self {
            user_id: UserId(0),
            username: "system".to_string(),
            admin: true,
        }
    }

    /// Returns whether the actor is an administrator.
    pub fn is_admin(&self) -> bool {
        self.admin
    }
}
