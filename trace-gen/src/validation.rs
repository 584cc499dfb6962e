//! Stream checks run by `validate-trace`
use std::collections::BTreeMap;
use trcstream_recorder::config::RecorderConfig;
use trcstream_recorder::format::{MAX_ARGS, MAX_FORMAT_LEN};
use trcstream_transit::{EventCount, EventRecord, iter_records};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CoreSummary {
    pub events: u64,
    /// events missing from the sequence, dropped by a full sink
    pub dropped: u64,
    pub last_sequence: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub offset: usize,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub cores: BTreeMap<usize, CoreSummary>,
    pub violations: Vec<Violation>,
    pub bytes: usize,
}

impl ValidationReport {
    pub fn events(&self) -> u64 {
        self.cores.values().map(|core| core.events).sum()
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

fn check_record(record: &EventRecord, config: &RecorderConfig) -> Vec<String> {
    let header = &record.header;
    let mut problems = Vec::new();
    if header.code.event_id() != config.printf_event_id {
        problems.push(format!(
            "event id 0x{:03X}, expected 0x{:03X}",
            header.code.event_id(),
            config.printf_event_id
        ));
    }
    if u16::from(header.code.param_count()) != header.args_len & 0xF {
        problems.push(format!(
            "parameter count {} does not match {} argument slots",
            header.code.param_count(),
            header.args_len
        ));
    }
    if usize::from(header.args_len) > MAX_ARGS {
        problems.push(format!("{} argument slots", header.args_len));
    }
    if usize::from(header.fmt_len) > MAX_FORMAT_LEN {
        problems.push(format!("{} format bytes", header.fmt_len));
    }
    problems
}

/// Decodes every record of `bytes` and checks it against `config`.
/// `on_event` sees every record that could be decoded, with its offset.
pub fn validate_stream<F>(bytes: &[u8], config: &RecorderConfig, mut on_event: F) -> ValidationReport
where
    F: FnMut(usize, &EventRecord),
{
    let multi_core = config.is_multi_core();
    let mask = if multi_core {
        EventCount::MULTI_CORE_SEQUENCE_MASK
    } else {
        u16::MAX
    };
    let mut report = ValidationReport {
        bytes: bytes.len(),
        ..Default::default()
    };
    let mut records = iter_records(bytes);
    let mut offset = records.offset();
    while let Some(result) = records.next() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                report.violations.push(Violation {
                    offset,
                    message: format!("{e:#}"),
                });
                break;
            }
        };
        on_event(offset, &record);
        for message in check_record(&record, config) {
            report.violations.push(Violation { offset, message });
        }

        let core = record.header.count.core(multi_core);
        if core >= config.core_count {
            report.violations.push(Violation {
                offset,
                message: format!("core {core} outside of the {} configured", config.core_count),
            });
        }
        let sequence = record.header.count.sequence(multi_core);
        let summary = report.cores.entry(core).or_default();
        summary.events += 1;
        if let Some(last) = summary.last_sequence {
            let delta = sequence.wrapping_sub(last) & mask;
            if delta == 0 {
                report.violations.push(Violation {
                    offset,
                    message: format!("duplicate sequence {sequence} on core {core}"),
                });
            } else if delta > mask / 2 {
                report.violations.push(Violation {
                    offset,
                    message: format!("sequence goes back from {last} to {sequence} on core {core}"),
                });
            } else {
                summary.dropped += u64::from(delta - 1);
            }
        }
        summary.last_sequence = Some(sequence);
        offset = records.offset();
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use trcstream_recorder::prelude::*;

    fn capture(events: u32, fail_every: Option<u32>) -> (Vec<u8>, RecorderConfig) {
        let recorder = RecorderBuilder::new()
            .with_sink(BoundedBufferSink::new(64 * 1024))
            .build()
            .unwrap();
        let mut out = Vec::new();
        let mut dropped = Vec::new();
        for i in 0..events {
            recorder.printf("step %u of %s", &[i.into(), "run".into()]).unwrap();
            // discarding an event leaves a hole in the sequence
            let target = if fail_every.is_some_and(|n| i % n == 0) {
                &mut dropped
            } else {
                &mut out
            };
            recorder.transfer(target).unwrap();
        }
        (out, recorder.config().clone())
    }

    #[test]
    fn test_valid_stream() {
        let (bytes, config) = capture(10, None);
        let mut seen = 0;
        let report = validate_stream(&bytes, &config, |_, _| seen += 1);
        assert!(report.is_valid(), "{:?}", report.violations);
        assert_eq!(seen, 10);
        assert_eq!(report.events(), 10);
        assert_eq!(report.cores[&0].dropped, 0);
    }

    #[test]
    fn test_gaps_are_counted() {
        let (bytes, config) = capture(10, Some(3));
        let report = validate_stream(&bytes, &config, |_, _| {});
        assert!(report.is_valid());
        // events 0, 3, 6 and 9 were discarded
        assert_eq!(report.events(), 6);
        assert_eq!(report.cores[&0].dropped, 2);
    }

    #[test]
    fn test_duplicate_sequence() {
        let (bytes, config) = capture(1, None);
        let doubled = [bytes.clone(), bytes].concat();
        let report = validate_stream(&doubled, &config, |_, _| {});
        assert_eq!(report.violations.len(), 1);
        assert!(report.violations[0].message.contains("duplicate"));
    }

    #[test]
    fn test_truncated_stream() {
        let (bytes, config) = capture(2, None);
        let truncated = &bytes[..bytes.len() - 3];
        let report = validate_stream(truncated, &config, |_, _| {});
        assert_eq!(report.events(), 1);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].offset, bytes.len() / 2);
    }

    #[test]
    fn test_wrong_event_id() {
        let (bytes, config) = capture(1, None);
        let other = RecorderConfig {
            printf_event_id: 0x0FA1,
            ..config
        };
        let report = validate_stream(&bytes, &other, |_, _| {});
        assert!(!report.is_valid());
    }
}
