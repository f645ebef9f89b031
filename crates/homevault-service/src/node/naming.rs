//! Node name validation.

use homevault_core::error::AppError;
use homevault_core::result::AppResult;

/// Fail with `BadRequest` unless `name` can be a single path segment.
pub fn validate_name(name: &str) -> AppResult<()> {
    if name.is_empty() {
        return Err(AppError::bad_request("Name must not be empty"));
    }
    if name == "." || name == ".." {
        return Err(AppError::bad_request(format!("Invalid name '{name}'")));
    }
    if name.contains('/') {
        return Err(AppError::bad_request(format!(
            "Name '{name}' must not contain '/'"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(AppError::bad_request(
            "Name must not contain control characters",
        ));
    }
    Ok(())
}
