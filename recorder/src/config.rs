//! Recorder settings and the builder assembling a [`Recorder`]
use crate::cores::{CoreIdentity, SingleCore};
use crate::errors::{Error, Result};
use crate::event::{BoundedBufferSink, BoxedStreamSink, StreamSink};
use crate::recorder::Recorder;
use crate::symbols::{SymbolInterner, SymbolTable};
use crate::time::{TickCounter, TimeSource};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use trcstream_transit::{LAST_RESERVED_EVENT_ID, MAX_EVENT_ID};

/// event id of formatted events unless configured otherwise
pub const DEFAULT_PRINTF_EVENT_ID: u16 = 0x0FA0;

/// the core index has to fit in the high nibble of the event count
pub const MAX_CORE_COUNT: usize = 16;

pub const DEFAULT_CHANNEL_NAME: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecorderConfig {
    pub printf_event_id: u16,
    pub core_count: usize,
    pub channel_name: String,
    pub symbol_capacity: usize,
    pub start_enabled: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            printf_event_id: DEFAULT_PRINTF_EVENT_ID,
            core_count: 1,
            channel_name: DEFAULT_CHANNEL_NAME.to_owned(),
            symbol_capacity: SymbolTable::DEFAULT_CAPACITY,
            start_enabled: true,
        }
    }
}

impl RecorderConfig {
    pub fn is_multi_core(&self) -> bool {
        self.core_count > 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.printf_event_id <= LAST_RESERVED_EVENT_ID {
            return Err(Error::InvalidConfig(format!(
                "printf event id 0x{:X} collides with reserved kernel events (0..=0x{LAST_RESERVED_EVENT_ID:X})",
                self.printf_event_id
            )));
        }
        if self.printf_event_id > MAX_EVENT_ID {
            return Err(Error::InvalidConfig(format!(
                "printf event id 0x{:X} does not fit in 12 bits",
                self.printf_event_id
            )));
        }
        if !(1..=MAX_CORE_COUNT).contains(&self.core_count) {
            return Err(Error::InvalidConfig(format!(
                "core count {} outside of 1..={MAX_CORE_COUNT}",
                self.core_count
            )));
        }
        if self.channel_name.is_empty() {
            return Err(Error::InvalidConfig("empty channel name".to_owned()));
        }
        Ok(())
    }
}

fn parse_event_id(value: &str) -> Option<u16> {
    let value = value.trim();
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

fn env_override<T>(name: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let value = std::env::var(name).ok()?;
    let parsed = parse(&value);
    if parsed.is_none() {
        log::warn!("ignoring {name}={value:?}, using the default");
    }
    parsed
}

/// Assembles a [`Recorder`]. Collaborators left unset get the host
/// implementations: a 64 KiB [`BoundedBufferSink`], a [`SymbolTable`], the
/// [`TickCounter`] and [`SingleCore`].
pub struct RecorderBuilder {
    config: RecorderConfig,
    sink: Option<BoxedStreamSink>,
    interner: Option<Arc<dyn SymbolInterner>>,
    time_source: Option<Arc<dyn TimeSource>>,
    cores: Option<Arc<dyn CoreIdentity>>,
    init_print: bool,
}

impl Default for RecorderBuilder {
    fn default() -> Self {
        Self {
            config: RecorderConfig::default(),
            sink: None,
            interner: None,
            time_source: None,
            cores: None,
            init_print: true,
        }
    }
}

impl RecorderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `TRCSTREAM_CORE_COUNT`,
    /// `TRCSTREAM_PRINTF_EVENT_ID`, `TRCSTREAM_SYMBOL_CAPACITY` and
    /// `TRCSTREAM_CHANNEL`.
    pub fn from_env() -> Self {
        let mut builder = Self::default();
        if let Some(core_count) =
            env_override("TRCSTREAM_CORE_COUNT", |v| usize::from_str(v.trim()).ok())
        {
            builder.config.core_count = core_count;
        }
        if let Some(event_id) = env_override("TRCSTREAM_PRINTF_EVENT_ID", parse_event_id) {
            builder.config.printf_event_id = event_id;
        }
        if let Some(capacity) =
            env_override("TRCSTREAM_SYMBOL_CAPACITY", |v| usize::from_str(v.trim()).ok())
        {
            builder.config.symbol_capacity = capacity;
        }
        if let Some(channel) =
            env_override("TRCSTREAM_CHANNEL", |v| (!v.is_empty()).then(|| v.to_owned()))
        {
            builder.config.channel_name = channel;
        }
        builder
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    #[must_use]
    pub fn with_config(mut self, config: RecorderConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_printf_event_id(mut self, event_id: u16) -> Self {
        self.config.printf_event_id = event_id;
        self
    }

    #[must_use]
    pub fn with_core_count(mut self, core_count: usize) -> Self {
        self.config.core_count = core_count;
        self
    }

    #[must_use]
    pub fn with_channel_name(mut self, name: impl Into<String>) -> Self {
        self.config.channel_name = name.into();
        self
    }

    /// Capacity of the default symbol table, ignored with [`Self::with_interner`].
    #[must_use]
    pub fn with_symbol_capacity(mut self, capacity: usize) -> Self {
        self.config.symbol_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_start_enabled(mut self, enabled: bool) -> Self {
        self.config.start_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_sink<Sink>(mut self, sink: Sink) -> Self
    where
        Sink: StreamSink + 'static,
    {
        self.sink = Some(Box::new(sink));
        self
    }

    #[must_use]
    pub fn with_interner(mut self, interner: Arc<dyn SymbolInterner>) -> Self {
        self.interner = Some(interner);
        self
    }

    #[must_use]
    pub fn with_time_source<Source>(mut self, time_source: Source) -> Self
    where
        Source: TimeSource + 'static,
    {
        self.time_source = Some(Arc::new(time_source));
        self
    }

    #[must_use]
    pub fn with_core_identity<Cores>(mut self, cores: Cores) -> Self
    where
        Cores: CoreIdentity + 'static,
    {
        self.cores = Some(Arc::new(cores));
        self
    }

    /// The default channel is registered by an explicit
    /// [`Recorder::init_print`] call instead of by `build`.
    #[must_use]
    pub fn with_deferred_print_init(mut self) -> Self {
        self.init_print = false;
        self
    }

    pub fn build(self) -> Result<Recorder> {
        self.config.validate()?;
        let interner = self
            .interner
            .unwrap_or_else(|| Arc::new(SymbolTable::new(self.config.symbol_capacity)));
        let recorder = Recorder::new(
            self.config,
            self.sink.unwrap_or_else(|| Box::new(BoundedBufferSink::default())),
            interner,
            self.time_source.unwrap_or_else(|| Arc::new(TickCounter)),
            self.cores.unwrap_or_else(|| Arc::new(SingleCore)),
        );
        if self.init_print {
            recorder.init_print()?;
        }
        Ok(recorder)
    }
}
