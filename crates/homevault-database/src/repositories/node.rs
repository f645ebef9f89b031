//! Node catalog queries.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use homevault_core::error::{AppError, ErrorKind};
use homevault_core::result::AppResult;
use homevault_core::types::{NodeId, UserId};
use homevault_entity::node::{NewNode, Node, NodeType};

use super::map_write_error;

/// Find a node by ID.
pub async fn find_by_id(conn: &mut SqliteConnection, id: NodeId) -> AppResult<Option<Node>> {
    sqlx::query_as::<_, Node>("SELECT * FROM nodes WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find node", e))
}

/// Load a node by ID, failing with `NotFound` if it does not exist.
pub async fn get(conn: &mut SqliteConnection, id: NodeId) -> AppResult<Node> {
    find_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Node {id} not found")))
}

/// Find the child of `parent_id` named `name`.
pub async fn find_child(
    conn: &mut SqliteConnection,
    parent_id: NodeId,
    name: &str,
) -> AppResult<Option<Node>> {
    sqlx::query_as::<_, Node>("SELECT * FROM nodes WHERE parent_id = ? AND name = ?")
        .bind(parent_id)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find child node", e))
}

/// List the direct children of a directory in catalog order.
pub async fn children(conn: &mut SqliteConnection, parent_id: NodeId) -> AppResult<Vec<Node>> {
    sqlx::query_as::<_, Node>("SELECT * FROM nodes WHERE parent_id = ? ORDER BY id ASC")
        .bind(parent_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
}

/// Count the direct children of a directory.
pub async fn count_children(conn: &mut SqliteConnection, parent_id: NodeId) -> AppResult<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM nodes WHERE parent_id = ?")
        .bind(parent_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count children", e))
}

/// List every node in the catalog.
pub async fn all(conn: &mut SqliteConnection) -> AppResult<Vec<Node>> {
    sqlx::query_as::<_, Node>("SELECT * FROM nodes ORDER BY id ASC")
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list nodes", e))
}

/// List every node of the given type.
pub async fn all_of_type(conn: &mut SqliteConnection, node_type: NodeType) -> AppResult<Vec<Node>> {
    sqlx::query_as::<_, Node>("SELECT * FROM nodes WHERE node_type = ? ORDER BY id ASC")
        .bind(node_type)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list nodes by type", e))
}

/// List file nodes whose MIME type is one of `mime_types`.
pub async fn files_with_mime(
    conn: &mut SqliteConnection,
    mime_types: &[&str],
    only_missing_thumb: bool,
) -> AppResult<Vec<Node>> {
    if mime_types.is_empty() {
        return Ok(Vec::new());
    }

    let mut query: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new("SELECT * FROM nodes WHERE node_type = 'file' AND mime_type IN (");
    let mut separated = query.separated(", ");
    for mime in mime_types {
        separated.push_bind(*mime);
    }
    separated.push_unseparated(")");
    if only_missing_thumb {
        query.push(" AND has_custom_thumb = 0");
    }
    query.push(" ORDER BY id ASC");

    query
        .build_query_as::<Node>()
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list media nodes", e))
}

/// Find an owner's nodes whose names contain every term.
pub async fn search(
    conn: &mut SqliteConnection,
    owner_id: UserId,
    terms: &[String],
) -> AppResult<Vec<Node>> {
    let mut query: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new("SELECT * FROM nodes WHERE owner_id = ");
    query.push_bind(owner_id);
    for term in terms {
        query.push(" AND LOWER(name) LIKE '%' || ");
        query.push_bind(escape_like(&term.to_lowercase()));
        query.push(" || '%' ESCAPE '\\'");
    }
    query.push(" ORDER BY name ASC");

    query
        .build_query_as::<Node>()
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search nodes", e))
}

/// Make `%` and `_` in a search term match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Insert a node. A sibling with the same name yields `Conflict`.
pub async fn insert(conn: &mut SqliteConnection, data: &NewNode) -> AppResult<Node> {
    sqlx::query_as::<_, Node>(
        "INSERT INTO nodes \
            (parent_id, name, node_type, mime_type, size, length, modified_on, owner_id, has_custom_thumb) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(data.parent_id)
    .bind(&data.name)
    .bind(data.node_type)
    .bind(&data.mime_type)
    .bind(data.size)
    .bind(data.length)
    .bind(Utc::now())
    .bind(data.owner_id)
    .bind(data.has_custom_thumb)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        map_write_error(
            e,
            || format!("A node named '{}' already exists", data.name),
            "Failed to insert node",
        )
    })
}

/// Change a node's name.
pub async fn rename(conn: &mut SqliteConnection, id: NodeId, name: &str) -> AppResult<Node> {
    sqlx::query_as::<_, Node>(
        "UPDATE nodes SET name = ?, modified_on = ? WHERE id = ? RETURNING *",
    )
    .bind(name)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| {
        map_write_error(
            e,
            || format!("A node named '{name}' already exists"),
            "Failed to rename node",
        )
    })?
    .ok_or_else(|| AppError::not_found(format!("Node {id} not found")))
}

/// Re-parent a node.
pub async fn set_parent(
    conn: &mut SqliteConnection,
    id: NodeId,
    parent_id: NodeId,
) -> AppResult<Node> {
    sqlx::query_as::<_, Node>(
        "UPDATE nodes SET parent_id = ?, modified_on = ? WHERE id = ? RETURNING *",
    )
    .bind(parent_id)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| {
        map_write_error(
            e,
            || format!("Destination {parent_id} already holds a node with that name"),
            "Failed to move node",
        )
    })?
    .ok_or_else(|| AppError::not_found(format!("Node {id} not found")))
}

/// Replace content metadata after new bytes were uploaded.
pub async fn update_content(
    conn: &mut SqliteConnection,
    id: NodeId,
    mime_type: &str,
    size: i64,
    length: Option<f64>,
) -> AppResult<Node> {
    sqlx::query_as::<_, Node>(
        "UPDATE nodes SET mime_type = ?, size = ?, length = ?, modified_on = ? \
         WHERE id = ? RETURNING *",
    )
    .bind(mime_type)
    .bind(size)
    .bind(length)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update node content", e))?
    .ok_or_else(|| AppError::not_found(format!("Node {id} not found")))
}

/// Store derived media attributes. Leaves `modified_on` untouched.
pub async fn update_media(
    conn: &mut SqliteConnection,
    id: NodeId,
    length: Option<f64>,
    has_custom_thumb: bool,
) -> AppResult<Node> {
    sqlx::query_as::<_, Node>(
        "UPDATE nodes SET length = ?, has_custom_thumb = ? WHERE id = ? RETURNING *",
    )
    .bind(length)
    .bind(has_custom_thumb)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update node media", e))?
    .ok_or_else(|| AppError::not_found(format!("Node {id} not found")))
}

/// Delete a single node row. Children must already be gone.
pub async fn delete(conn: &mut SqliteConnection, id: NodeId) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM nodes WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete node", e))?;
    Ok(result.rows_affected() > 0)
}
