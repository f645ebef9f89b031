//! Processing queue entities.

pub mod model;

pub use model::{NewProcessingRequest, ProcessingRequest};
