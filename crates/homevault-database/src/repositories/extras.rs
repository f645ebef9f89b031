//! Per-user side tables: viewing progress and typed metadata.

use chrono::Utc;
use sqlx::SqliteConnection;
use sqlx::types::Json;

use homevault_core::error::{AppError, ErrorKind};
use homevault_core::result::AppResult;
use homevault_core::types::{NodeId, UserId};
use homevault_entity::node::{NodeMeta, ViewProgress};

/// Insert or replace a viewer's playback progress.
pub async fn upsert_progress(
    conn: &mut SqliteConnection,
    node_id: NodeId,
    user_id: UserId,
    volume: f64,
    progress: f64,
) -> AppResult<ViewProgress> {
    sqlx::query_as::<_, ViewProgress>(
        "INSERT INTO view_progress (node_id, user_id, volume, progress, updated_at) \
         VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT (node_id, user_id) DO UPDATE SET \
            volume = excluded.volume, \
            progress = excluded.progress, \
            updated_at = excluded.updated_at \
         RETURNING *",
    )
    .bind(node_id)
    .bind(user_id)
    .bind(volume)
    .bind(progress)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save progress", e))
}

/// A viewer's progress on one node.
pub async fn progress_for(
    conn: &mut SqliteConnection,
    node_id: NodeId,
    user_id: UserId,
) -> AppResult<Option<ViewProgress>> {
    sqlx::query_as::<_, ViewProgress>(
        "SELECT * FROM view_progress WHERE node_id = ? AND user_id = ?",
    )
    .bind(node_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load progress", e))
}

/// A viewer's progress on every child of a directory.
pub async fn progress_for_children(
    conn: &mut SqliteConnection,
    parent_id: NodeId,
    user_id: UserId,
) -> AppResult<Vec<ViewProgress>> {
    sqlx::query_as::<_, ViewProgress>(
        "SELECT p.* FROM view_progress p \
         INNER JOIN nodes n ON n.id = p.node_id \
         WHERE n.parent_id = ? AND p.user_id = ?",
    )
    .bind(parent_id)
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load progress", e))
}

/// Insert or replace typed metadata.
pub async fn upsert_meta(
    conn: &mut SqliteConnection,
    node_id: NodeId,
    user_id: UserId,
    meta_type: &str,
    data: &serde_json::Value,
) -> AppResult<NodeMeta> {
    sqlx::query_as::<_, NodeMeta>(
        "INSERT INTO node_meta (node_id, user_id, meta_type, data) VALUES (?, ?, ?, ?) \
         ON CONFLICT (node_id, user_id, meta_type) DO UPDATE SET data = excluded.data \
         RETURNING *",
    )
    .bind(node_id)
    .bind(user_id)
    .bind(meta_type)
    .bind(Json(data))
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save node metadata", e))
}

/// All metadata a user attached to a node.
pub async fn meta_for(
    conn: &mut SqliteConnection,
    node_id: NodeId,
    user_id: UserId,
) -> AppResult<Vec<NodeMeta>> {
    sqlx::query_as::<_, NodeMeta>(
        "SELECT * FROM node_meta WHERE node_id = ? AND user_id = ? ORDER BY meta_type ASC",
    )
    .bind(node_id)
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load node metadata", e))
}
