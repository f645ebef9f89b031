//! User accounts and their root directories.

pub mod service;

pub use service::UserService;
