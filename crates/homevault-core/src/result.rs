//! Convenience result type alias for HomeVault.

use crate::error::AppError;

/// A specialized `Result` type for HomeVault operations.
pub type AppResult<T> = Result<T, AppError>;
