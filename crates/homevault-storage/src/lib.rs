//! # homevault-storage
//!
//! Physical side of the node tree: the ID-keyed content and thumbnail
//! layout, local filesystem helpers, content type detection, and the
//! shell-based media toolkit.

pub mod layout;
pub mod local;
pub mod media;
pub mod mime;

pub use layout::StorageLayout;
pub use media::ShellMediaToolkit;
pub use mime::ContentMimeDetector;
