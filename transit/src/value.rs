use serde::{Deserialize, Serialize};
use std::fmt;

/// Argument of a decoded printf event, typed by its conversion specifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Argument {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    Hex(u32),
    F32(f32),
    Char(char),
    Pointer(u32),
    String(String),
    /// `%s` slot whose handle could not be resolved, 0 when interning failed
    UnresolvedSymbol(u32),
}

impl Argument {
    pub fn is_symbol(&self) -> bool {
        matches!(self, Argument::String(_) | Argument::UnresolvedSymbol(_))
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::I8(v) => write!(f, "{v}"),
            Argument::U8(v) => write!(f, "{v}"),
            Argument::I16(v) => write!(f, "{v}"),
            Argument::U16(v) => write!(f, "{v}"),
            Argument::I32(v) => write!(f, "{v}"),
            Argument::U32(v) => write!(f, "{v}"),
            Argument::Hex(v) => write!(f, "{v:x}"),
            Argument::F32(v) => write!(f, "{v}"),
            Argument::Char(v) => write!(f, "{v}"),
            Argument::Pointer(v) => write!(f, "0x{v:08x}"),
            Argument::String(v) => write!(f, "{v}"),
            Argument::UnresolvedSymbol(0) => write!(f, "<unresolved>"),
            Argument::UnresolvedSymbol(handle) => write!(f, "<symbol 0x{handle:x}>"),
        }
    }
}
