//! Node tree: access rules, naming rules, path resolution, mutations,
//! and the transactional façade used by callers.

pub mod access;
pub mod extras;
pub mod mutation;
pub mod naming;
pub mod path;
pub mod service;

pub use extras::DirectoryListing;
pub use mutation::MutationEngine;
pub use service::NodeService;
