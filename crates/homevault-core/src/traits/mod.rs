//! Trait definitions for collaborators the core calls out to.

pub mod media;
pub mod mime;

pub use media::MediaToolkit;
pub use mime::MimeDetector;
