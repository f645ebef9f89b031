//! Processing request entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use homevault_core::types::{NodeId, RequestId};

/// A durable request to generate derived artifacts for one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProcessingRequest {
    /// Queue position; lower IDs are taken first.
    pub id: RequestId,
    /// Node to process.
    pub node_id: NodeId,
    /// File to read from, usually an upload distinct from the content path.
    pub source_path: String,
    /// Remove `source_path` once processing has been attempted.
    pub delete_source: bool,
    /// When the request was enqueued.
    pub created_at: DateTime<Utc>,
}

/// Data required to enqueue a processing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProcessingRequest {
    pub node_id: NodeId,
    pub source_path: String,
    pub delete_source: bool,
}
