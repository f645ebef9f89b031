//! Content type detection abstraction.

use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;

use crate::result::AppResult;

/// Detects the MIME type of a file on disk.
#[async_trait]
pub trait MimeDetector: Send + Sync + Debug + 'static {
    /// Detect the MIME type of the file at `path`.
    ///
    /// Zero-length and unrecognized files resolve to a default type rather
    /// than an error; only I/O failures are reported.
    async fn detect(&self, path: &Path) -> AppResult<String>;
}
