//! # homevault-core
//!
//! Core crate for HomeVault. Contains the unified error system,
//! configuration schemas, typed identifiers, media type classification,
//! and the traits implemented by external tool collaborators.
//!
//! This crate has **no** internal dependencies on other HomeVault crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
