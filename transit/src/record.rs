use crate::{EventHeader, HEADER_SIZE, SLOT_SIZE, SymbolLookup, render::Rendered, render::render};
use anyhow::{Context, Result, bail};
use byteorder::{ByteOrder, LittleEndian};

/// Serializes a complete record into `out`, which must be exactly
/// `header.record_size()` bytes long.
pub fn write_record(out: &mut [u8], header: &EventHeader, slots: &[u32], fmt: &[u8]) {
    assert_eq!(slots.len(), usize::from(header.args_len));
    assert_eq!(fmt.len(), usize::from(header.fmt_len));
    assert_eq!(out.len(), header.record_size());
    header.write_to(&mut out[..HEADER_SIZE]);
    let slots_end = HEADER_SIZE + SLOT_SIZE * slots.len();
    LittleEndian::write_u32_into(slots, &mut out[HEADER_SIZE..slots_end]);
    out[slots_end..].copy_from_slice(fmt);
}

/// Decoded printf event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub header: EventHeader,
    pub slots: Vec<u32>,
    pub format: Vec<u8>,
}

impl EventRecord {
    /// format bytes as text, invalid utf8 sequences are replaced
    pub fn format_str(&self) -> String {
        String::from_utf8_lossy(&self.format).into_owned()
    }

    pub fn render(&self, symbols: &dyn SymbolLookup) -> Rendered {
        render(&self.format, &self.slots, symbols)
    }
}

/// Parses the record at the beginning of `buffer`, returns it with the number
/// of bytes it occupies.
pub fn parse_record(buffer: &[u8]) -> Result<(EventRecord, usize)> {
    let header = EventHeader::read_from(buffer).with_context(|| "reading event header")?;
    let size = header.record_size();
    if buffer.len() < size {
        bail!(
            "truncated record: header announces {size} bytes, {} available",
            buffer.len()
        );
    }
    let slots_end = HEADER_SIZE + SLOT_SIZE * usize::from(header.args_len);
    let mut slots = vec![0_u32; usize::from(header.args_len)];
    LittleEndian::read_u32_into(&buffer[HEADER_SIZE..slots_end], &mut slots);
    let format = buffer[slots_end..size].to_vec();
    Ok((
        EventRecord {
            header,
            slots,
            format,
        },
        size,
    ))
}

/// Iterates over the records of a concatenated stream.
/// Stops after the first error.
pub struct RecordIter<'a> {
    window: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> RecordIter<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            window: buffer,
            offset: 0,
            failed: false,
        }
    }

    /// number of bytes consumed so far
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for RecordIter<'_> {
    type Item = Result<EventRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.window.is_empty() {
            return None;
        }
        match parse_record(self.window) {
            Ok((record, size)) => {
                self.window = &self.window[size..];
                self.offset += size;
                Some(Ok(record))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e.context(format!("parsing record at offset {}", self.offset))))
            }
        }
    }
}

pub fn iter_records(buffer: &[u8]) -> RecordIter<'_> {
    RecordIter::new(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventCode, EventCount, record_size};
    use std::collections::HashMap;

    fn make_record(count: u16, slots: &[u32], fmt: &str) -> Vec<u8> {
        let header = EventHeader {
            code: EventCode::new(0x0FA0, slots.len()),
            count: EventCount(count),
            timestamp: 100 + u32::from(count),
            channel: 1,
            args_len: slots.len() as u16,
            fmt_len: fmt.len() as u16,
        };
        let mut out = vec![0_u8; header.record_size()];
        write_record(&mut out, &header, slots, fmt.as_bytes());
        out
    }

    #[test]
    fn test_parse_stream() {
        let mut stream = make_record(1, &[(-2_i32) as u32, 32], "int %d, unsigned %u");
        stream.extend(make_record(2, &[], "100%% done"));
        let records: Vec<EventRecord> = iter_records(&stream).map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].slots, vec![0xFFFF_FFFE, 32]);
        assert_eq!(records[0].format_str(), "int %d, unsigned %u");
        assert_eq!(records[1].header.count, EventCount(2));
        assert_eq!(records[1].header.args_len, 0);

        let symbols: HashMap<u32, String> = HashMap::new();
        assert_eq!(records[0].render(&symbols).text, "int -2, unsigned 32");
        assert_eq!(records[1].render(&symbols).text, "100% done");
    }

    #[test]
    fn test_truncated_stream() {
        let mut stream = make_record(1, &[5], "%u");
        let full = stream.len();
        stream.extend(make_record(2, &[6], "%u"));
        stream.truncate(full + record_size(1, 2) - 1);
        let mut iter = iter_records(&stream);
        assert!(iter.next().unwrap().is_ok());
        assert_eq!(iter.offset(), full);
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none());
    }
}
