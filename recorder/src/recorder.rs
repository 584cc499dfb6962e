//! Streaming encoder of formatted events
use crate::args::{TraceArg, materialize};
use crate::config::RecorderConfig;
use crate::cores::CoreIdentity;
use crate::critical_section::CriticalSection;
use crate::errors::{Error, Result};
use crate::event::BoxedStreamSink;
use crate::format::{FormatScan, scan_format};
use crate::symbols::{SymbolHandle, SymbolInterner};
use crate::time::TimeSource;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use trcstream_transit::{EventCode, EventCount, EventHeader, write_record};

/// Named destination of formatted events, backed by a symbol the recorder
/// keeps registered for its whole lifetime.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Channel(SymbolHandle);

impl Channel {
    pub fn handle(&self) -> u32 {
        self.0.get()
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum EncodeOutcome {
    /// the whole record was handed to the sink in one commit
    Committed { bytes: usize },
    /// recording is disabled, nothing was done
    Disabled,
}

/// State only touched inside the critical section
struct RecorderState {
    core_counters: Vec<u32>,
    sink: BoxedStreamSink,
}

impl RecorderState {
    fn next_count(&mut self, core: usize, multi_core: bool) -> EventCount {
        assert!(
            core < self.core_counters.len(),
            "core {core} reported, recorder configured for {} cores",
            self.core_counters.len()
        );
        let counter = &mut self.core_counters[core];
        *counter = counter.wrapping_add(1);
        if multi_core {
            EventCount::multi_core(core, *counter)
        } else {
            EventCount::single_core(*counter)
        }
    }
}

pub struct Recorder {
    config: RecorderConfig,
    state: CriticalSection<RecorderState>,
    interner: Arc<dyn SymbolInterner>,
    time_source: Arc<dyn TimeSource>,
    cores: Arc<dyn CoreIdentity>,
    enabled: AtomicBool,
    default_channel: OnceLock<Channel>,
    /// bytes taken from the sink and not written out yet
    outbox: Mutex<Vec<u8>>,
}

impl Recorder {
    /// Prefer [`crate::config::RecorderBuilder`], which validates the
    /// configuration.
    pub fn new(
        config: RecorderConfig,
        sink: BoxedStreamSink,
        interner: Arc<dyn SymbolInterner>,
        time_source: Arc<dyn TimeSource>,
        cores: Arc<dyn CoreIdentity>,
    ) -> Self {
        let state = RecorderState {
            core_counters: vec![0; config.core_count],
            sink,
        };
        Self {
            enabled: AtomicBool::new(config.start_enabled),
            config,
            state: CriticalSection::new(state),
            interner,
            time_source,
            cores,
            default_channel: OnceLock::new(),
            outbox: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn interner(&self) -> &Arc<dyn SymbolInterner> {
        &self.interner
    }

    /// Registers a channel name. The reference is never released.
    pub fn register_channel(&self, name: &str) -> Result<Channel> {
        if name.is_empty() {
            return Err(Error::InvalidConfig("empty channel name".to_owned()));
        }
        self.interner.register(name).map(Channel)
    }

    /// Initializes the print component by registering the default channel.
    /// Calling it again returns the same channel.
    pub fn init_print(&self) -> Result<Channel> {
        if let Some(channel) = self.default_channel.get() {
            return Ok(*channel);
        }
        let channel = self.register_channel(&self.config.channel_name)?;
        if let Err(channel) = self.default_channel.set(channel) {
            // initialized concurrently, give back our reference
            self.interner.release(channel.0);
        }
        self.default_channel
            .get()
            .copied()
            .ok_or(Error::NotInitialized)
    }

    pub fn default_channel(&self) -> Option<Channel> {
        self.default_channel.get().copied()
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Records a formatted event on the default channel.
    pub fn printf(&self, format: &str, args: &[TraceArg<'_>]) -> Result<EncodeOutcome> {
        self.vprintf(format, args)
    }

    /// Same as [`Self::printf`].
    ///
    /// # Panics
    /// When the print component was not initialized.
    pub fn vprintf(&self, format: &str, args: &[TraceArg<'_>]) -> Result<EncodeOutcome> {
        if !self.is_enabled() {
            return Ok(EncodeOutcome::Disabled);
        }
        let Some(channel) = self.default_channel() else {
            panic!("printf called before the print component was initialized");
        };
        self.vprintf_on(channel, format, args)
    }

    pub fn printf_channel(
        &self,
        channel: Channel,
        format: &str,
        args: &[TraceArg<'_>],
    ) -> Result<EncodeOutcome> {
        self.vprintf_on(channel, format, args)
    }

    /// Scans `format`, materializes `args` and writes one record to the
    /// sink. Symbols interned for string arguments are released before
    /// returning, whether the event was committed or dropped.
    pub fn vprintf_on(
        &self,
        channel: Channel,
        format: &str,
        args: &[TraceArg<'_>],
    ) -> Result<EncodeOutcome> {
        if !self.is_enabled() {
            return Ok(EncodeOutcome::Disabled);
        }
        let scan = scan_format(format);
        let materialized = materialize(&scan, args, self.interner.as_ref());
        let result = self.encode(
            channel,
            &scan,
            materialized.slots(),
            &format.as_bytes()[..scan.fmt_len],
        );
        materialized.release(self.interner.as_ref());
        if scan.is_truncated() {
            log::trace!(
                "{} conversions in {format:?}, only the first {} recorded",
                scan.requested_args,
                scan.args_len
            );
        }
        if let Err(e) = &result {
            log::debug!("printf event dropped: {e}");
        }
        result
    }

    fn encode(
        &self,
        channel: Channel,
        scan: &FormatScan,
        slots: &[u32],
        format: &[u8],
    ) -> Result<EncodeOutcome> {
        let core = self.cores.current_core();
        let mut state = self.state.enter();
        let header = EventHeader {
            code: EventCode::new(self.config.printf_event_id, scan.args_len),
            count: state.next_count(core, self.config.is_multi_core()),
            timestamp: self.time_source.now(),
            channel: channel.handle(),
            args_len: scan.args_len as u16,
            fmt_len: scan.fmt_len as u16,
        };
        let size = header.record_size();
        let buffer = state.sink.allocate(size)?;
        write_record(&mut buffer[..size], &header, slots, format);
        let bytes = state.sink.commit(size);
        Ok(EncodeOutcome::Committed { bytes })
    }

    /// Sequence counter of `core`, the value stamped on its last event.
    pub fn counter(&self, core: usize) -> Option<u32> {
        self.state.enter().core_counters.get(core).copied()
    }

    /// Resets every per-core counter.
    pub fn restart(&self) {
        self.state.enter().core_counters.fill(0);
        log::trace!("recorder restarted, event counters reset");
    }

    /// Moves the committed bytes of the sink to `out`.
    ///
    /// Only the draining of the sink happens in the critical section, `out`
    /// is written after it is released. Bytes that could not be written are
    /// kept and sent first by the next call.
    pub fn transfer(&self, out: &mut dyn Write) -> io::Result<usize> {
        let mut outbox = self.outbox.lock().unwrap_or_else(PoisonError::into_inner);
        self.state.enter().sink.take_committed(&mut outbox);
        out.write_all(&outbox)?;
        let transferred = outbox.len();
        outbox.clear();
        Ok(transferred)
    }
}
