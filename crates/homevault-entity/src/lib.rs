//! # homevault-entity
//!
//! Catalog entity models for HomeVault. Every struct in this crate is a
//! database row or a read model assembled from rows. Row types derive
//! `sqlx::FromRow`.

pub mod node;
pub mod processing;
pub mod user;
