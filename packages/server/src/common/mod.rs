pub mod auth;
pub mod utils;

pub use auth::*;
pub use utils::*;
