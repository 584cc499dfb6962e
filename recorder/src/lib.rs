//! Recorder crate
//!
//! Streaming encoder of formatted (printf-style) trace events for real-time
//! targets. A call is turned into one self-describing binary record: a
//! 16-byte header, one 32-bit slot per argument and the raw format bytes.
//! String arguments are not copied, they are interned in a symbol table and
//! recorded as a handle.
//!
//! The record is written directly in the memory handed out by the stream
//! sink, under a critical section that also stamps the per-core sequence
//! number and the timestamp. The encoder never blocks on anything else and
//! does not guarantee delivery: when the sink is full the event is dropped
//! and the caller is told so.
//!
//! # Examples
//! ```
//! use trcstream_recorder::prelude::*;
//! use trcstream_recorder::event::in_memory_sink::InMemorySink;
//!
//! let sink = InMemorySink::new();
//! let state = sink.state();
//! let recorder = RecorderBuilder::new()
//!     .with_sink(sink)
//!     .with_time_source(ManualClock::new(0))
//!     .build()
//!     .unwrap();
//!
//! recorder
//!     .printf("int %d, unsigned %u", &[(-2_i32).into(), 32_u32.into()])
//!     .unwrap();
//!
//! let records = state.lock().unwrap().records().unwrap();
//! assert_eq!(records[0].header.args_len, 2);
//! assert_eq!(records[0].slots, vec![0xFFFF_FFFE, 32]);
//! ```

// crate-specific lint exceptions:
#![allow(unsafe_code, clippy::missing_errors_doc, clippy::inline_always)]

pub mod args;
pub mod config;
pub mod cores;
pub mod critical_section;
pub mod dispatch;
pub mod errors;
pub mod event;
pub mod format;
pub mod recorder;
pub mod symbols;
pub mod test_utils;
pub mod time;

#[macro_use]
extern crate lazy_static;

#[macro_use]
mod macros;

pub mod prelude {
    pub use crate::args::TraceArg;
    pub use crate::config::{RecorderBuilder, RecorderConfig};
    pub use crate::cores::*;
    pub use crate::errors::{Error, Result};
    pub use crate::event::{BoundedBufferSink, NullStreamSink, StreamSink};
    pub use crate::recorder::{Channel, EncodeOutcome, Recorder};
    pub use crate::symbols::{SymbolHandle, SymbolInterner, SymbolTable};
    pub use crate::time::{ManualClock, TickCounter, TimeSource};
    pub use crate::trace_printf;
}
