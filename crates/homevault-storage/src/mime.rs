//! Content-sniffing MIME detection.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use homevault_core::error::{AppError, ErrorKind};
use homevault_core::result::AppResult;
use homevault_core::traits::MimeDetector;
use homevault_core::types::media::{strip_parameters, EMPTY_FILE_TYPE, UNKNOWN_TYPE};

/// Bytes inspected when sniffing magic numbers.
const SNIFF_LEN: usize = 8192;

/// Detects MIME types from magic bytes, then from the file extension.
#[derive(Debug, Clone, Default)]
pub struct ContentMimeDetector;

impl ContentMimeDetector {
    pub fn new() -> Self {
        Self
    }

    /// Classify an already-read header.
    pub fn classify(path: &Path, header: &[u8]) -> String {
        if header.is_empty() {
            return EMPTY_FILE_TYPE.to_string();
        }
        if let Some(kind) = infer::get(header) {
            return strip_parameters(kind.mime_type()).to_string();
        }
        mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| UNKNOWN_TYPE.to_string())
    }
}

#[async_trait]
impl MimeDetector for ContentMimeDetector {
    async fn detect(&self, path: &Path) -> AppResult<String> {
        let mut file = File::open(path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to open {} for type detection", path.display()),
                e,
            )
        })?;

        let mut header = vec![0u8; SNIFF_LEN];
        let mut filled = 0;
        while filled < SNIFF_LEN {
            let n = file.read(&mut header[filled..]).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read {}", path.display()),
                    e,
                )
            })?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        header.truncate(filled);

        Ok(Self::classify(path, &header))
    }
}
