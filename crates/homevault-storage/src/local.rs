//! Local filesystem helpers for content placement and cleanup.

use std::path::Path;

use tokio::fs;
use tracing::{debug, warn};

use homevault_core::config::IngestMode;
use homevault_core::error::{AppError, ErrorKind};
use homevault_core::result::AppResult;

/// Create a directory and all of its parents.
pub async fn ensure_dir(path: &Path) -> AppResult<()> {
    fs::create_dir_all(path).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to create directory: {}", path.display()),
            e,
        )
    })
}

/// Whether a path resolves to an existing entry. Dangling symlinks count as
/// missing.
pub async fn exists(path: &Path) -> AppResult<bool> {
    match fs::metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to stat {}", path.display()),
            e,
        )),
    }
}

/// Size of a regular file in bytes.
pub async fn file_size(path: &Path) -> AppResult<i64> {
    let meta = fs::metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::not_found(format!("File not found: {}", path.display()))
        } else {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to stat {}", path.display()),
                e,
            )
        }
    })?;
    if !meta.is_file() {
        return Err(AppError::bad_request(format!(
            "Not a regular file: {}",
            path.display()
        )));
    }
    Ok(meta.len() as i64)
}

/// Put `source` at `dest` by copying, linking or moving, replacing whatever
/// is there.
pub async fn place(source: &Path, dest: &Path, mode: IngestMode) -> AppResult<()> {
    file_size(source).await?;

    if let Some(parent) = dest.parent() {
        ensure_dir(parent).await?;
    }
    remove_quietly(dest).await?;

    match mode {
        IngestMode::Copy => {
            copy(source, dest).await?;
        }
        IngestMode::Symlink => link(source, dest).await?,
        IngestMode::Move => relocate(source, dest).await?,
    }

    debug!(
        source = %source.display(),
        dest = %dest.display(),
        ?mode,
        "Placed content"
    );
    Ok(())
}

/// Copy bytes from `source` to `dest`, creating the parent directory.
pub async fn copy(source: &Path, dest: &Path) -> AppResult<u64> {
    if let Some(parent) = dest.parent() {
        ensure_dir(parent).await?;
    }
    fs::copy(source, dest).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!(
                "Failed to copy {} to {}",
                source.display(),
                dest.display()
            ),
            e,
        )
    })
}

/// Move `source` to `dest`. Falls back to copy-then-remove across
/// filesystems. A symlinked source is resolved so `dest` holds the bytes.
async fn relocate(source: &Path, dest: &Path) -> AppResult<()> {
    let is_link = fs::symlink_metadata(source)
        .await
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false);

    if !is_link {
        match fs::rename(source, dest).await {
            Ok(()) => return Ok(()),
            Err(e) => debug!(
                source = %source.display(),
                dest = %dest.display(),
                error = %e,
                "Rename failed, copying instead"
            ),
        }
    }

    copy(source, dest).await?;
    remove_quietly(source).await
}

#[cfg(unix)]
async fn link(source: &Path, dest: &Path) -> AppResult<()> {
    let target = fs::canonicalize(source).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to resolve {}", source.display()),
            e,
        )
    })?;
    fs::symlink(&target, dest).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!(
                "Failed to link {} to {}",
                dest.display(),
                target.display()
            ),
            e,
        )
    })
}

#[cfg(not(unix))]
async fn link(source: &Path, dest: &Path) -> AppResult<()> {
    copy(source, dest).await.map(|_| ())
}

/// Remove a file, treating "already gone" as success.
pub async fn remove_quietly(path: &Path) -> AppResult<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to remove {}", path.display()),
            e,
        )),
    }
}

/// Remove a directory if it is empty. Returns whether it was removed.
pub async fn remove_empty_dir(path: &Path) -> bool {
    match fs::remove_dir(path).await {
        Ok(()) => true,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Directory kept");
            false
        }
    }
}

/// Remove a file, logging failures instead of returning them.
///
/// Returns whether a file was actually removed.
pub async fn remove_best_effort(path: &Path, what: &str) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove {what}");
            false
        }
    }
}
