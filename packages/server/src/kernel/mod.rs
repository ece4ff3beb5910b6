pub mod deps;
pub mod jobs;
pub mod store;

pub use deps::*;
pub use store::*;
