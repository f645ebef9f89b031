//! Processing queue configuration.

use serde::{Deserialize, Serialize};

/// Settings for the background processing worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Whether the server starts the processor.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum number of requests processed concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Capacity of the wake-up signal channel. Signals beyond this are dropped.
    #[serde(default = "default_signal_capacity")]
    pub signal_capacity: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: default_concurrency(),
            signal_capacity: default_signal_capacity(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    8
}

fn default_signal_capacity() -> usize {
    50_000
}
