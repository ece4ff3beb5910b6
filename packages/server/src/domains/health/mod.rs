//! Pipeline health: aggregated metrics and a threshold verdict.

pub mod monitor;

pub use monitor::*;
