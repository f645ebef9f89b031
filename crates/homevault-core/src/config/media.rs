//! External media tool configuration.

use serde::{Deserialize, Serialize};

use crate::types::media::ThumbMethod;

/// Binaries and parameters for thumbnail and duration generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Cropping/scaling strategy for generated thumbnails.
    #[serde(default)]
    pub thumb_method: ThumbMethod,
    /// Thumbnail width in pixels.
    #[serde(default = "default_thumb_width")]
    pub thumb_width: u32,
    /// ImageMagick `convert` binary.
    #[serde(default = "default_convert")]
    pub convert_bin: String,
    /// `ffmpeg` binary, used to grab video frames.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_bin: String,
    /// `ffprobe` binary, used to probe media duration.
    #[serde(default = "default_ffprobe")]
    pub ffprobe_bin: String,
    /// Ghostscript binary, used to render PDF pages.
    #[serde(default = "default_gs")]
    pub ghostscript_bin: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            thumb_method: ThumbMethod::default(),
            thumb_width: default_thumb_width(),
            convert_bin: default_convert(),
            ffmpeg_bin: default_ffmpeg(),
            ffprobe_bin: default_ffprobe(),
            ghostscript_bin: default_gs(),
        }
    }
}

fn default_thumb_width() -> u32 {
    600
}

fn default_convert() -> String {
    "convert".to_string()
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_gs() -> String {
    "gs".to_string()
}
