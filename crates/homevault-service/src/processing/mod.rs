//! Producer side of the processing queue.

pub mod queue;

pub use queue::{ProcessingQueue, QueueSignal};
