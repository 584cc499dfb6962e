//! Fixed 16-byte header preceding every printf event
use anyhow::{Result, bail};
use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use std::fmt;

/// size in bytes of a serialized [`EventHeader`]
pub const HEADER_SIZE: usize = 16;

/// size in bytes of one argument slot
pub const SLOT_SIZE: usize = std::mem::size_of::<u32>();

/// identifiers up to this value belong to the kernel events of the recorder
pub const LAST_RESERVED_EVENT_ID: u16 = 0xFF;

/// largest identifier that fits below the parameter count nibble
pub const MAX_EVENT_ID: u16 = 0x0FFF;

/// Event id in the low 12 bits, parameter count in the high nibble.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct EventCode(pub u16);

impl EventCode {
    pub fn new(event_id: u16, param_count: usize) -> Self {
        Self((event_id & MAX_EVENT_ID) | (((param_count as u16) & 0xF) << 12))
    }

    pub fn event_id(&self) -> u16 {
        self.0 & MAX_EVENT_ID
    }

    pub fn param_count(&self) -> u8 {
        ((self.0 >> 12) & 0xF) as u8
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

/// Per-core sequence number as it appears on the wire.
///
/// Single-core streams use the whole 16 bits for the sequence. Multi-core
/// streams pack the core index in the high nibble and keep 12 bits of
/// sequence.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct EventCount(pub u16);

impl EventCount {
    pub const MULTI_CORE_SEQUENCE_MASK: u16 = 0x0FFF;

    pub fn single_core(counter: u32) -> Self {
        Self(counter as u16)
    }

    pub fn multi_core(core: usize, counter: u32) -> Self {
        Self(
            (((core as u16) & 0xF) << 12)
                | ((counter as u16) & Self::MULTI_CORE_SEQUENCE_MASK),
        )
    }

    pub fn core(&self, multi_core: bool) -> usize {
        if multi_core {
            usize::from(self.0 >> 12)
        } else {
            0
        }
    }

    pub fn sequence(&self, multi_core: bool) -> u16 {
        if multi_core {
            self.0 & Self::MULTI_CORE_SEQUENCE_MASK
        } else {
            self.0
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct EventHeader {
    pub code: EventCode,
    pub count: EventCount,
    pub timestamp: u32,
    pub channel: u32,
    pub args_len: u16,
    pub fmt_len: u16,
}

impl EventHeader {
    /// Bytes taken by the header and the payload it announces.
    pub fn record_size(&self) -> usize {
        record_size(usize::from(self.args_len), usize::from(self.fmt_len))
    }

    pub fn write_to(&self, out: &mut [u8]) {
        assert!(out.len() >= HEADER_SIZE);
        LittleEndian::write_u16(&mut out[0..2], self.code.0);
        LittleEndian::write_u16(&mut out[2..4], self.count.0);
        LittleEndian::write_u32(&mut out[4..8], self.timestamp);
        LittleEndian::write_u32(&mut out[8..12], self.channel);
        LittleEndian::write_u16(&mut out[12..14], self.args_len);
        LittleEndian::write_u16(&mut out[14..16], self.fmt_len);
    }

    pub fn read_from(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < HEADER_SIZE {
            bail!(
                "event header needs {HEADER_SIZE} bytes, {} available",
                buffer.len()
            );
        }
        Ok(Self {
            code: EventCode(LittleEndian::read_u16(&buffer[0..2])),
            count: EventCount(LittleEndian::read_u16(&buffer[2..4])),
            timestamp: LittleEndian::read_u32(&buffer[4..8]),
            channel: LittleEndian::read_u32(&buffer[8..12]),
            args_len: LittleEndian::read_u16(&buffer[12..14]),
            fmt_len: LittleEndian::read_u16(&buffer[14..16]),
        })
    }
}

pub fn record_size(args_len: usize, fmt_len: usize) -> usize {
    HEADER_SIZE + SLOT_SIZE * args_len + fmt_len
}
