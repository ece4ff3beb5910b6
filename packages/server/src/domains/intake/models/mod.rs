pub mod processed_message;

pub use processed_message::*;
