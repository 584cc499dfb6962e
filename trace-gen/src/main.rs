use anyhow::{Context, Result, bail};
use clap::Parser;
use std::cell::Cell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};
use trcstream_recorder::config::MAX_CORE_COUNT;
use trcstream_recorder::prelude::*;
use trcstream_recorder::time::frequency;
use trcstream_trace_gen::workload::emit_sample;
use trcstream_trace_gen::{TraceMetadata, try_init_tracing_subscriber};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of threads emitting events, each one bound to its own core
    #[arg(short, long, default_value_t = 4)]
    threads: usize,

    /// Events emitted by each thread
    #[arg(short, long, default_value_t = 1000)]
    events: u32,

    /// Number of cores of the recorder, at least the number of threads
    #[arg(short, long)]
    cores: Option<usize>,

    /// Capacity in bytes of the staging buffer
    #[arg(long, default_value_t = BoundedBufferSink::DEFAULT_CAPACITY)]
    capacity: usize,

    /// Output trace file path, symbols are written to <output>.symbols.json
    #[arg(short, long, default_value = "trace.bin")]
    output: PathBuf,
}

thread_local! {
    static CORE: Cell<usize> = const { Cell::new(0) };
}

type SharedOutput = Arc<Mutex<BufWriter<File>>>;

fn worker(recorder: &Recorder, output: &SharedOutput, core: usize, events: u32) -> Result<()> {
    CORE.with(|c| c.set(core));
    let name = format!("worker-{core}");
    for i in 0..events {
        match emit_sample(recorder, &name, i, events) {
            Ok(_) => {}
            Err(Error::SinkFull { requested, .. }) => {
                // the event is lost, make room for the next ones
                debug!("staging buffer full, {requested} bytes dropped");
                let mut out = output.lock().unwrap_or_else(PoisonError::into_inner);
                recorder.transfer(&mut *out)?;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    try_init_tracing_subscriber()?;
    let args = Args::parse();
    let cores = args.cores.unwrap_or(args.threads);
    if args.threads == 0 || args.threads > cores || cores > MAX_CORE_COUNT {
        bail!(
            "need 1 to {MAX_CORE_COUNT} cores and at least one per thread ({} threads, {cores} cores)",
            args.threads
        );
    }

    let symbols = Arc::new(SymbolTable::default().with_history());
    let recorder = Arc::new(
        RecorderBuilder::from_env()
            .with_core_count(cores)
            .with_core_identity(|| CORE.with(Cell::get))
            .with_sink(BoundedBufferSink::new(args.capacity))
            .with_interner(symbols.clone())
            .build()?,
    );
    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let output: SharedOutput = Arc::new(Mutex::new(BufWriter::new(file)));

    info!(
        "emitting {} events on {} threads into {}",
        args.events,
        args.threads,
        args.output.display()
    );
    let handles: Vec<_> = (0..args.threads)
        .map(|core| {
            let recorder = recorder.clone();
            let output = output.clone();
            std::thread::spawn(move || worker(&recorder, &output, core, args.events))
        })
        .collect();
    for handle in handles {
        match handle.join() {
            Ok(result) => result?,
            Err(_) => bail!("worker thread panicked"),
        }
    }

    let mut out = output.lock().unwrap_or_else(PoisonError::into_inner);
    recorder.transfer(&mut *out)?;
    out.flush()?;
    drop(out);

    let metadata = TraceMetadata {
        config: recorder.config().clone(),
        timer_frequency: u64::try_from(frequency()).unwrap_or(0),
        symbols: symbols.snapshot(),
    };
    let metadata_path = TraceMetadata::path_for(&args.output);
    metadata.save(&metadata_path)?;
    info!(
        "trace written to {}, {} symbols in {}",
        args.output.display(),
        metadata.symbols.len(),
        metadata_path.display()
    );
    Ok(())
}
