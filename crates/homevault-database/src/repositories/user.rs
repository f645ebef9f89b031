//! User queries.

use sqlx::SqliteConnection;

use homevault_core::error::{AppError, ErrorKind};
use homevault_core::result::AppResult;
use homevault_core::types::{NodeId, UserId};
use homevault_entity::user::{NewUser, User};

use super::map_write_error;

/// Find a user by ID.
pub async fn find_by_id(conn: &mut SqliteConnection, id: UserId) -> AppResult<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
}

/// Load a user by ID, failing with `NotFound`.
pub async fn get(conn: &mut SqliteConnection, id: UserId) -> AppResult<User> {
    find_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
}

/// Find a user by login name.
pub async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> AppResult<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by name", e))
}

/// List all users ordered by ID.
pub async fn all(conn: &mut SqliteConnection) -> AppResult<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id ASC")
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list users", e))
}

/// Create a user without a root node.
pub async fn insert(conn: &mut SqliteConnection, data: &NewUser) -> AppResult<User> {
    sqlx::query_as::<_, User>("INSERT INTO users (name, admin) VALUES (?, ?) RETURNING *")
        .bind(&data.name)
        .bind(data.admin)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                || format!("User '{}' already exists", data.name),
                "Failed to create user",
            )
        })
}

/// Persist the user's root node.
pub async fn set_root(conn: &mut SqliteConnection, id: UserId, root_id: NodeId) -> AppResult<User> {
    sqlx::query_as::<_, User>("UPDATE users SET root_id = ? WHERE id = ? RETURNING *")
        .bind(root_id)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to set user root", e))?
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
}
