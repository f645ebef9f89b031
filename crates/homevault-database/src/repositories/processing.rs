//! Processing request backlog queries.

use chrono::Utc;
use sqlx::SqliteConnection;

use homevault_core::error::{AppError, ErrorKind};
use homevault_core::result::AppResult;
use homevault_entity::processing::{NewProcessingRequest, ProcessingRequest};

/// Append a request to the backlog.
pub async fn insert(
    conn: &mut SqliteConnection,
    data: &NewProcessingRequest,
) -> AppResult<ProcessingRequest> {
    sqlx::query_as::<_, ProcessingRequest>(
        "INSERT INTO processing_requests (node_id, source_path, delete_source, created_at) \
         VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(data.node_id)
    .bind(&data.source_path)
    .bind(data.delete_source)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        AppError::with_source(ErrorKind::Database, "Failed to enqueue processing request", e)
    })
}

/// Remove and return the oldest pending request, if any.
///
/// Selection and deletion happen in one statement, so two callers can never
/// receive the same row.
pub async fn take_oldest(conn: &mut SqliteConnection) -> AppResult<Option<ProcessingRequest>> {
    sqlx::query_as::<_, ProcessingRequest>(
        "DELETE FROM processing_requests \
         WHERE id = (SELECT id FROM processing_requests ORDER BY id ASC LIMIT 1) \
         RETURNING *",
    )
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| {
        AppError::with_source(ErrorKind::Database, "Failed to take processing request", e)
    })
}

/// Number of pending requests.
pub async fn count(conn: &mut SqliteConnection) -> AppResult<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM processing_requests")
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count processing requests", e)
        })
}

/// List pending requests in queue order.
pub async fn pending(conn: &mut SqliteConnection, limit: i64) -> AppResult<Vec<ProcessingRequest>> {
    sqlx::query_as::<_, ProcessingRequest>(
        "SELECT * FROM processing_requests ORDER BY id ASC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| {
        AppError::with_source(ErrorKind::Database, "Failed to list processing requests", e)
    })
}
