//! Administrative sweeps over the catalog.

pub mod thumbnails;

pub use thumbnails::regenerate_thumbnails;
