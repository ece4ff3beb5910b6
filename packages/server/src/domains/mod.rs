pub mod health;
pub mod intake;
pub mod listings;
pub mod source;
