//! Source registry: configured origins of raw content.

pub mod models;

pub use models::*;
