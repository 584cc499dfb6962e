//! transit library
//! wire format of the printf events produced by the recorder
//!
//! An event is a 16-byte little endian header followed by `args_len` 32-bit
//! argument slots and `fmt_len` raw bytes of format string. String arguments
//! are never inlined, their slot holds a symbol reference resolved through a
//! [`SymbolLookup`] when the event is rendered.

mod header;
mod record;
pub mod render;
mod symbol_lookup;
mod value;

pub use header::*;
pub use record::*;
pub use symbol_lookup::*;
pub use value::*;

pub mod prelude {
    pub use crate::{
        Argument, EventCode, EventCount, EventHeader, EventRecord, HEADER_SIZE, SLOT_SIZE,
        SymbolLookup, iter_records, parse_record, record_size, write_record,
    };
}
