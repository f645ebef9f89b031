//! External media tool abstraction.

use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::media::ThumbMethod;

/// Opaque thumbnail and duration generation.
///
/// Implementations typically shell out to external binaries. Calls may
/// take arbitrarily long; no timeout is imposed by callers.
#[async_trait]
pub trait MediaToolkit: Send + Sync + Debug + 'static {
    /// Probe the playback length of an audio or video file, in seconds.
    async fn probe_duration(&self, path: &Path) -> AppResult<f64>;

    /// Render a thumbnail of `source` into `dest`.
    ///
    /// `mime` selects the decoding path (image, video frame, PDF page).
    async fn generate_thumbnail(
        &self,
        source: &Path,
        dest: &Path,
        mime: &str,
        method: ThumbMethod,
    ) -> AppResult<()>;
}
