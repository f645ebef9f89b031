//! # homevault-database
//!
//! SQLite connection management and the node catalog: free-standing
//! repository functions that run against any connection, so the same
//! query serves both plain reads and multi-step write transactions.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::{DatabasePool, WriteTransaction};
pub use sqlx::SqliteConnection;
