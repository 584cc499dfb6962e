use crate::config::RecorderBuilder;
use crate::dispatch::{init_recorder, shutdown_recorder};
use crate::event::in_memory_sink::{InMemorySink, MemSinkState};
use crate::symbols::SymbolTable;
use crate::time::ManualClock;
use std::sync::{Arc, Mutex};

/// RAII guard installing a global recorder that writes to an
/// [`InMemorySink`], uninstalled when dropped.
///
/// # Important
/// Tests using this guard MUST be marked with #[serial] since they
/// share global state through init_recorder.
pub struct InMemoryRecorderGuard {
    pub sink: Arc<Mutex<MemSinkState>>,
    pub symbols: Arc<SymbolTable>,
}

impl Default for InMemoryRecorderGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecorderGuard {
    pub fn new() -> Self {
        Self::with_builder(RecorderBuilder::new())
    }

    /// Installs the recorder configured by `builder`, the sink, interner and
    /// time source are replaced by in-memory ones.
    pub fn with_builder(builder: RecorderBuilder) -> Self {
        let sink = InMemorySink::new();
        let state = sink.state();
        let symbols = Arc::new(SymbolTable::new(builder.config().symbol_capacity).with_history());
        let recorder = builder
            .with_sink(sink)
            .with_interner(symbols.clone())
            .with_time_source(ManualClock::new(1))
            .build()
            .expect("Failed to build recorder");
        init_recorder(recorder).expect("Failed to initialize recorder");
        Self {
            sink: state,
            symbols,
        }
    }
}

impl Drop for InMemoryRecorderGuard {
    fn drop(&mut self) {
        shutdown_recorder();
    }
}
