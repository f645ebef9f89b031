//! # homevault-service
//!
//! The node tree engine. Resolves logical paths, applies mutations that
//! keep the catalog and the ID-keyed physical store in step, manages user
//! roots, and feeds the durable processing queue.
//!
//! Services follow constructor injection: all dependencies are provided at
//! construction time and are cheap to clone.

pub mod context;
pub mod node;
pub mod processing;
pub mod user;

pub use context::Actor;
pub use node::{MutationEngine, NodeService};
pub use processing::{ProcessingQueue, QueueSignal};
pub use user::UserService;
