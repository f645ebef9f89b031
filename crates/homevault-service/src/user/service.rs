//! User creation and lazy root provisioning.

use tracing::info;

use homevault_core::error::{AppError, ErrorKind};
use homevault_core::result::AppResult;
use homevault_core::types::UserId;
use homevault_database::{DatabasePool, SqliteConnection};
use homevault_database::repositories::{node as node_repo, user as user_repo};
use homevault_entity::node::Node;
use homevault_entity::user::{NewUser, User};
use homevault_storage::local;

use crate::node::MutationEngine;
use crate::node::naming::validate_name;

/// Manages users and guarantees each has a root directory.
#[derive(Debug, Clone)]
pub struct UserService {
    db: DatabasePool,
    engine: MutationEngine,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(db: DatabasePool, engine: MutationEngine) -> Self {
        Self { db, engine }
    }

    /// Create a user together with its root directory.
    pub async fn create(&self, name: &str, admin: bool) -> AppResult<(User, Node)> {
        validate_name(name)?;
        let mut tx = self.db.begin_write().await?;
        let user = user_repo::insert(
            &mut tx,
            &NewUser {
                name: name.to_string(),
                admin,
            },
        )
        .await?;
        let (user, root) = self.provision_root(&mut tx, user).await?;
        tx.commit().await?;

        info!(user_id = %user.id, name, admin, root_id = %root.id, "Created user");
        Ok((user, root))
    }

    /// Return the named user, creating it on first sight.
    pub async fn find_or_create(&self, name: &str) -> AppResult<(User, Node)> {
        let existing = {
            let mut conn = self.db.acquire().await?;
            user_repo::find_by_name(&mut conn, name).await?
        };
        match existing {
            Some(user) => self.ensure_root(user.id).await,
            None => match self.create(name, false).await {
                // Lost a race with a concurrent first login.
                Err(e) if e.is(ErrorKind::Conflict) => {
                    let user = self.by_name(name).await?;
                    self.ensure_root(user.id).await
                }
                other => other,
            },
        }
    }

    /// Load a user's root, creating it if the user has none yet.
    pub async fn ensure_root(&self, user_id: UserId) -> AppResult<(User, Node)> {
        let mut tx = self.db.begin_write().await?;
        let user = user_repo::get(&mut tx, user_id).await?;
        let (user, root) = self.provision_root(&mut tx, user).await?;
        tx.commit().await?;
        Ok((user, root))
    }

    async fn provision_root(
        &self,
        conn: &mut SqliteConnection,
        user: User,
    ) -> AppResult<(User, Node)> {
        if let Some(root_id) = user.root_id {
            if let Some(root) = node_repo::find_by_id(&mut *conn, root_id).await? {
                return Ok((user, root));
            }
        }

        let root = self.engine.create_root(&mut *conn, &user).await?;
        let user = user_repo::set_root(&mut *conn, user.id, root.id).await?;
        local::ensure_dir(&self.engine.layout().home_dir(&user.name)).await?;
        info!(user_id = %user.id, root_id = %root.id, "Provisioned root directory");
        Ok((user, root))
    }

    /// Look up a user by name.
    pub async fn by_name(&self, name: &str) -> AppResult<User> {
        let mut conn = self.db.acquire().await?;
        user_repo::find_by_name(&mut conn, name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User '{name}' not found")))
    }

    /// Look up a user by ID.
    pub async fn by_id(&self, id: UserId) -> AppResult<User> {
        let mut conn = self.db.acquire().await?;
        user_repo::get(&mut conn, id).await
    }

    /// All users ordered by ID.
    pub async fn list(&self) -> AppResult<Vec<User>> {
        let mut conn = self.db.acquire().await?;
        user_repo::all(&mut conn).await
    }
}
