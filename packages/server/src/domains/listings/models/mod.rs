pub mod casting_call;

pub use casting_call::*;
