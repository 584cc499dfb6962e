//! Typed printf arguments and their conversion into fixed-width slots
use crate::format::{FormatScan, MAX_ARGS};
use crate::symbols::{SymbolHandle, SymbolInterner};

/// One printf argument, built by the caller or by [`crate::trace_printf`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceArg<'a> {
    I32(i32),
    U32(u32),
    F32(f32),
    Char(char),
    /// address, only the low 32 bits are recorded
    Ptr(usize),
    Str(&'a str),
}

impl TraceArg<'_> {
    /// Raw slot value for a non-string conversion.
    pub fn word(&self) -> u32 {
        match *self {
            TraceArg::I32(v) => v as u32,
            TraceArg::U32(v) => v,
            TraceArg::F32(v) => v.to_bits(),
            TraceArg::Char(v) => v as u32,
            TraceArg::Ptr(v) => v as u32,
            TraceArg::Str(_) => 0,
        }
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for TraceArg<'_> {
            fn from(value: $t) -> Self {
                TraceArg::I32(i32::from(value))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for TraceArg<'_> {
            fn from(value: $t) -> Self {
                TraceArg::U32(u32::from(value))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32);
impl_from_unsigned!(u8, u16, u32, bool);

impl From<f32> for TraceArg<'_> {
    fn from(value: f32) -> Self {
        TraceArg::F32(value)
    }
}

impl From<char> for TraceArg<'_> {
    fn from(value: char) -> Self {
        TraceArg::Char(value)
    }
}

impl<'a> From<&'a str> for TraceArg<'a> {
    fn from(value: &'a str) -> Self {
        TraceArg::Str(value)
    }
}

impl<'a> From<&'a String> for TraceArg<'a> {
    fn from(value: &'a String) -> Self {
        TraceArg::Str(value.as_str())
    }
}

impl<T> From<*const T> for TraceArg<'_> {
    fn from(value: *const T) -> Self {
        TraceArg::Ptr(value as usize)
    }
}

/// Argument slots of one event, with the symbol references it owns
#[derive(Debug)]
pub struct MaterializedArgs {
    slots: [u32; MAX_ARGS],
    len: usize,
    owned: [Option<SymbolHandle>; MAX_ARGS],
}

impl MaterializedArgs {
    pub fn slots(&self) -> &[u32] {
        &self.slots[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// handles acquired while materializing, in slot order
    pub fn owned_symbols(&self) -> impl Iterator<Item = SymbolHandle> + '_ {
        self.owned.iter().flatten().copied()
    }

    /// Gives back every acquired reference. Consumes self so that a reference
    /// cannot be released twice.
    pub fn release(self, interner: &dyn SymbolInterner) {
        for handle in self.owned.into_iter().flatten() {
            interner.release(handle);
        }
    }
}

/// Pulls exactly `scan.args_len` arguments from `args`, interning the ones
/// flagged as strings. Missing arguments are recorded as 0.
pub fn materialize(
    scan: &FormatScan,
    args: &[TraceArg<'_>],
    interner: &dyn SymbolInterner,
) -> MaterializedArgs {
    let mut materialized = MaterializedArgs {
        slots: [0; MAX_ARGS],
        len: scan.args_len,
        owned: [None; MAX_ARGS],
    };
    for index in 0..scan.args_len {
        let arg = args.get(index).copied().unwrap_or(TraceArg::U32(0));
        if !scan.is_string_arg(index) {
            materialized.slots[index] = arg.word();
            continue;
        }
        let TraceArg::Str(name) = arg else {
            continue;
        };
        match interner.register(name) {
            Ok(handle) => {
                materialized.slots[index] = handle.get();
                materialized.owned[index] = Some(handle);
            }
            Err(e) => {
                log::debug!("string argument {index} recorded as unresolved: {e}");
            }
        }
    }
    materialized
}
