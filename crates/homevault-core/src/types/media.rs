//! MIME type classification for post-processing decisions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// MIME types rendered as images.
pub const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// MIME types treated as video. GIFs are animated, so they count as video.
pub const VIDEO_TYPES: &[&str] = &["video/mp4", "video/webm", "image/gif"];

/// MIME types treated as audio.
pub const AUDIO_TYPES: &[&str] = &[
    "audio/aac",
    "audio/flac",
    "audio/mpeg",
    "audio/ogg",
    "audio/x-m4a",
];

/// MIME type of PDF documents.
pub const PDF_TYPE: &str = "application/pdf";

/// Fallback for empty files.
pub const EMPTY_FILE_TYPE: &str = "text/plain";

/// Fallback for unrecognized content.
pub const UNKNOWN_TYPE: &str = "application/octet-stream";

/// MIME type stored on directory nodes.
pub const DIRECTORY_TYPE: &str = "inode/directory";

/// Coarse media category of a MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    Image,
    Video,
    Audio,
    Pdf,
    Other,
}

impl MediaClass {
    /// Classify a MIME type, ignoring any parameters such as `; charset=`.
    pub fn of(mime: &str) -> Self {
        let mime = strip_parameters(mime);
        if IMAGE_TYPES.contains(&mime) {
            Self::Image
        } else if VIDEO_TYPES.contains(&mime) {
            Self::Video
        } else if AUDIO_TYPES.contains(&mime) {
            Self::Audio
        } else if mime == PDF_TYPE {
            Self::Pdf
        } else {
            Self::Other
        }
    }

    /// Whether a duration probe applies.
    pub fn has_duration(&self) -> bool {
        matches!(self, Self::Audio | Self::Video)
    }

    /// Whether a thumbnail can be generated.
    pub fn is_thumbnailable(&self) -> bool {
        matches!(self, Self::Image | Self::Video | Self::Pdf)
    }
}

/// Every MIME type for which thumbnails are generated.
pub fn thumbnailable_types() -> Vec<&'static str> {
    IMAGE_TYPES
        .iter()
        .chain(VIDEO_TYPES.iter())
        .copied()
        .chain(std::iter::once(PDF_TYPE))
        .collect()
}

/// Drop MIME parameters: `text/plain; charset=utf-8` becomes `text/plain`.
pub fn strip_parameters(mime: &str) -> &str {
    mime.split(';').next().unwrap_or(mime).trim()
}

/// Cropping/scaling strategy for generated thumbnails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbMethod {
    /// Center crop to 16:9.
    #[default]
    Crop16x9,
    /// Center crop to a square.
    Crop1x1,
    /// Center crop to 4:3.
    Crop4x3,
    /// Scale to the target width, keep aspect ratio.
    ScaleWidth,
}

impl ThumbMethod {
    /// Height for a given width, or `None` when the aspect ratio is kept.
    pub fn height_for(&self, width: u32) -> Option<u32> {
        match self {
            Self::Crop16x9 => Some(width * 9 / 16),
            Self::Crop1x1 => Some(width),
            Self::Crop4x3 => Some(width * 3 / 4),
            Self::ScaleWidth => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crop16x9 => "crop16x9",
            Self::Crop1x1 => "crop1x1",
            Self::Crop4x3 => "crop4x3",
            Self::ScaleWidth => "scale_width",
        }
    }
}

impl fmt::Display for ThumbMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
