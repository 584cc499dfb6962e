//! Byte transports receiving the encoded events
mod sink;
pub use sink::*;

mod buffer_sink;
pub use buffer_sink::*;

pub mod in_memory_sink;
