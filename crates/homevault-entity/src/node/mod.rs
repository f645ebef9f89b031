//! Node domain entities.

pub mod extras;
pub mod model;
pub mod node_type;

pub use extras::{NodeMeta, NodeWithExtras, ViewProgress, META_TYPE_PROGRESS};
pub use model::{NewNode, Node};
pub use node_type::NodeType;
