//! Casting-call records: dedup guard, creation, and moderation.

pub mod dedup;
pub mod jobs;
pub mod models;
pub mod moderation;

pub use dedup::*;
pub use models::*;
pub use moderation::*;
