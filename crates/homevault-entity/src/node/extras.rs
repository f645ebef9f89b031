//! Per-user side tables joined onto nodes for display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use homevault_core::types::{NodeId, UserId};

use super::model::Node;

/// The only metadata type currently accepted by `set_meta`.
pub const META_TYPE_PROGRESS: &str = "progress";

/// Playback position of a media node for one viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ViewProgress {
    pub node_id: NodeId,
    pub user_id: UserId,
    /// Player volume in `[0, 1]`.
    pub volume: f64,
    /// Position in seconds.
    pub progress: f64,
    pub updated_at: DateTime<Utc>,
}

/// Typed JSON metadata attached to a node by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NodeMeta {
    pub node_id: NodeId,
    pub user_id: UserId,
    pub meta_type: String,
    pub data: sqlx::types::Json<serde_json::Value>,
}

/// A node together with the viewer-scoped extras that exist for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeWithExtras {
    #[serde(flatten)]
    pub node: Node,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ViewProgress>,
}

impl NodeWithExtras {
    /// Wrap a bare node.
    pub fn bare(node: Node) -> Self {
        Self {
            node,
            progress: None,
        }
    }
}
