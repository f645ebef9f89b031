//! Node entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use homevault_core::types::{NodeId, UserId};

use super::node_type::NodeType;

/// A file or directory in a user's tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Node {
    /// Unique node identifier. Physical locations are derived from it.
    pub id: NodeId,
    /// Parent directory (null only for a user's root).
    pub parent_id: Option<NodeId>,
    /// Path segment, unique among siblings.
    pub name: String,
    /// File or directory.
    pub node_type: NodeType,
    /// Detected MIME type.
    pub mime_type: String,
    /// Content size in bytes (0 for directories).
    pub size: i64,
    /// Playback length in seconds for audio and video.
    pub length: Option<f64>,
    /// Last content or metadata change.
    pub modified_on: DateTime<Utc>,
    /// Owning user.
    pub owner_id: UserId,
    /// Whether a generated thumbnail exists in the thumbnail store.
    pub has_custom_thumb: bool,
}

impl Node {
    /// Check if this is a root node (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.node_type == NodeType::Directory
    }

    /// Check if this node is a regular file.
    pub fn is_file(&self) -> bool {
        self.node_type == NodeType::File
    }
}

/// Data required to insert a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNode {
    /// Parent directory (None for a root).
    pub parent_id: Option<NodeId>,
    /// Node name.
    pub name: String,
    /// File or directory.
    pub node_type: NodeType,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Optional media length in seconds.
    pub length: Option<f64>,
    /// Owning user.
    pub owner_id: UserId,
    /// Whether a thumbnail already exists.
    pub has_custom_thumb: bool,
}
