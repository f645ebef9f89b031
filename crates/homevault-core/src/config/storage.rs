//! Physical storage configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How content is placed into the file store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestMode {
    /// Link the content path to the source file.
    #[default]
    Symlink,
    /// Duplicate the source bytes.
    Copy,
    /// Take the source file out of its directory. scan-new always ingests
    /// this way.
    Move,
}

/// Storage roots and bucketing parameters.
///
/// Empty root paths are derived from `data_root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for everything the service writes.
    #[serde(default = "default_data_root")]
    pub data_root: String,
    /// ID-keyed file content tree.
    #[serde(default)]
    pub files_root: String,
    /// ID-keyed thumbnail tree.
    #[serde(default)]
    pub thumbs_root: String,
    /// Directory holding one physical home directory per user.
    #[serde(default)]
    pub home_root: String,
    /// Scratch directory for uploads and intermediate tool output.
    #[serde(default)]
    pub temp_dir: String,
    /// Bucket size for file content directories.
    #[serde(default = "default_file_bucket")]
    pub file_bucket_size: i64,
    /// Bucket size for thumbnail directories.
    #[serde(default = "default_thumb_bucket")]
    pub thumb_bucket_size: i64,
    /// Placement strategy for CLI imports.
    #[serde(default)]
    pub ingest_mode: IngestMode,
}

impl StorageConfig {
    fn derived(&self, explicit: &str, leaf: &str) -> PathBuf {
        if explicit.is_empty() {
            PathBuf::from(&self.data_root).join(leaf)
        } else {
            PathBuf::from(explicit)
        }
    }

    /// Resolved file content root.
    pub fn files_root(&self) -> PathBuf {
        self.derived(&self.files_root, "files")
    }

    /// Resolved thumbnail root.
    pub fn thumbs_root(&self) -> PathBuf {
        self.derived(&self.thumbs_root, "thumbs")
    }

    /// Resolved home directory root.
    pub fn home_root(&self) -> PathBuf {
        self.derived(&self.home_root, "home")
    }

    /// Resolved scratch directory.
    pub fn temp_dir(&self) -> PathBuf {
        self.derived(&self.temp_dir, "tmp")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            files_root: String::new(),
            thumbs_root: String::new(),
            home_root: String::new(),
            temp_dir: String::new(),
            file_bucket_size: default_file_bucket(),
            thumb_bucket_size: default_thumb_bucket(),
            ingest_mode: IngestMode::default(),
        }
    }
}

fn default_data_root() -> String {
    "./data".to_string()
}

fn default_file_bucket() -> i64 {
    100
}

fn default_thumb_bucket() -> i64 {
    1000
}
