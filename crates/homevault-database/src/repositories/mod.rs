//! Catalog repositories.
//!
//! Each function takes `&mut SqliteConnection`, which is what both a pooled
//! read connection and a [`WriteTransaction`](crate::WriteTransaction)
//! dereference to.

pub mod extras;
pub mod node;
pub mod processing;
pub mod user;

use homevault_core::error::{AppError, ErrorKind};

/// Map an insert/update failure, turning unique violations into `Conflict`.
pub(crate) fn map_write_error(
    err: sqlx::Error,
    conflict: impl FnOnce() -> String,
    context: &str,
) -> AppError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::conflict(conflict())
        }
        _ => AppError::with_source(ErrorKind::Database, context.to_string(), err),
    }
}
