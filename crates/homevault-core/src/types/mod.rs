//! Core type definitions used across the HomeVault workspace.

pub mod id;
pub mod media;

pub use id::*;
pub use media::{MediaClass, ThumbMethod};
