//! ID-keyed physical storage layout.
//!
//! A node's content lives at `files_root/<bucket>/<id>` and its thumbnail at
//! `thumbs_root/<bucket>/<id>`, where `bucket = id - id % size` rendered as
//! eight zero-padded digits. Names and parents never enter the path, so
//! renames and moves touch only the catalog.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs;

use homevault_core::config::StorageConfig;
use homevault_core::error::{AppError, ErrorKind};
use homevault_core::result::AppResult;
use homevault_core::types::NodeId;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Resolved storage roots and bucket sizes.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    files_root: PathBuf,
    thumbs_root: PathBuf,
    home_root: PathBuf,
    temp_dir: PathBuf,
    file_bucket: i64,
    thumb_bucket: i64,
}

impl StorageLayout {
    /// Build a layout from configuration.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            files_root: config.files_root(),
            thumbs_root: config.thumbs_root(),
            home_root: config.home_root(),
            temp_dir: config.temp_dir(),
            file_bucket: config.file_bucket_size.max(1),
            thumb_bucket: config.thumb_bucket_size.max(1),
        }
    }

    /// Bucket directory name for an ID.
    pub fn bucket(id: NodeId, size: i64) -> String {
        let id = id.get();
        format!("{:08}", id - id.rem_euclid(size))
    }

    /// Where a file node's bytes are stored.
    pub fn content_path(&self, id: NodeId) -> PathBuf {
        self.content_dir(id).join(id.to_string())
    }

    /// Bucket directory holding a node's content.
    pub fn content_dir(&self, id: NodeId) -> PathBuf {
        self.files_root.join(Self::bucket(id, self.file_bucket))
    }

    /// Where a node's generated thumbnail is stored.
    pub fn thumb_path(&self, id: NodeId) -> PathBuf {
        self.thumb_dir(id).join(id.to_string())
    }

    /// Bucket directory holding a node's thumbnail.
    pub fn thumb_dir(&self, id: NodeId) -> PathBuf {
        self.thumbs_root.join(Self::bucket(id, self.thumb_bucket))
    }

    /// Physical home directory of a user.
    pub fn home_dir(&self, username: &str) -> PathBuf {
        self.home_root.join(username)
    }

    pub fn home_root(&self) -> &Path {
        &self.home_root
    }

    pub fn files_root(&self) -> &Path {
        &self.files_root
    }

    pub fn thumbs_root(&self) -> &Path {
        &self.thumbs_root
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// A fresh, unused path in the scratch directory.
    pub fn temp_file(&self, prefix: &str, extension: &str) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.temp_dir
            .join(format!("{prefix}-{}-{n}.{extension}", std::process::id()))
    }

    /// Create every root directory.
    pub async fn ensure_roots(&self) -> AppResult<()> {
        for dir in [
            &self.files_root,
            &self.thumbs_root,
            &self.home_root,
            &self.temp_dir,
        ] {
            fs::create_dir_all(dir).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create storage root: {}", dir.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}
