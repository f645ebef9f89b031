//! Reconciliation scanner configuration.

use serde::{Deserialize, Serialize};

/// Settings for the scan-new and scan-deleted sweeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Number of files ingested concurrently during scan-new.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Optional cron expression (with seconds) for scheduled reconciliation.
    #[serde(default)]
    pub schedule: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            schedule: None,
        }
    }
}

fn default_concurrency() -> usize {
    8
}
