//! Intake: receives one raw content item and decides whether it proceeds
//! into the pipeline.

pub mod envelope;
pub mod filter;
pub mod jobs;
pub mod models;

pub use envelope::*;
pub use filter::*;
pub use models::*;
