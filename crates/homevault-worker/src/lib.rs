//! Background work for HomeVault.
//!
//! This crate provides:
//! - The node processor: a bounded worker pool draining the processing queue
//! - The thumbnail regeneration sweep
//! - The reconciliation scanner (scan-deleted and scan-new)
//! - A cron scheduler that runs reconciliation periodically
//! - [`Runtime`], the wiring shared by the server and the CLI

pub mod jobs;
pub mod processor;
pub mod runtime;
pub mod scan;
pub mod scheduler;

pub use processor::NodeProcessor;
pub use runtime::Runtime;
pub use scan::{ScanLease, Scanner};
pub use scheduler::ScanScheduler;
