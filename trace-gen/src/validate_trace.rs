use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;
use trcstream_trace_gen::validation::validate_stream;
use trcstream_trace_gen::{TraceMetadata, try_init_tracing_subscriber};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Trace file written by trace-gen
    trace_file: PathBuf,

    /// Symbols and configuration, defaults to <trace-file>.symbols.json
    #[arg(short, long)]
    symbols: Option<PathBuf>,

    /// Do not print the rendered events
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<ExitCode> {
    try_init_tracing_subscriber()?;
    let args = Args::parse();

    let metadata_path = args
        .symbols
        .unwrap_or_else(|| TraceMetadata::path_for(&args.trace_file));
    let metadata = if metadata_path.exists() {
        TraceMetadata::load(&metadata_path)?
    } else {
        warn!(
            "{} not found, assuming a single core capture without symbols",
            metadata_path.display()
        );
        TraceMetadata::default()
    };

    let data = std::fs::read(&args.trace_file)
        .with_context(|| format!("reading {}", args.trace_file.display()))?;
    println!(
        "Validating {} ({} bytes)",
        args.trace_file.display(),
        data.len()
    );

    let multi_core = metadata.config.is_multi_core();
    let mut channels: BTreeMap<u32, u64> = BTreeMap::new();
    // timestamps are stamped in stream order and wrap at 32 bits
    let mut previous_timestamp: Option<u32> = None;
    let mut elapsed_ticks: u64 = 0;
    let report = validate_stream(&data, &metadata.config, |_offset, record| {
        *channels.entry(record.header.channel).or_insert(0) += 1;
        let timestamp = record.header.timestamp;
        if let Some(previous) = previous_timestamp {
            elapsed_ticks += u64::from(timestamp.wrapping_sub(previous));
        }
        previous_timestamp = Some(timestamp);
        if args.quiet {
            return;
        }
        let channel = metadata
            .symbols
            .get(&record.header.channel)
            .map_or("?", String::as_str);
        let rendered = record.render(&metadata.symbols);
        let time = match metadata.ticks_to_seconds(elapsed_ticks) {
            Some(seconds) => format!("{:>12.6}s", seconds),
            None => format!("t={timestamp:<10}"),
        };
        println!(
            "[core {}] #{:<5} {time} {channel}: {}",
            record.header.count.core(multi_core),
            record.header.count.sequence(multi_core),
            rendered.text
        );
    });

    println!("Events: {}", report.events());
    match metadata.ticks_to_seconds(elapsed_ticks) {
        Some(seconds) => println!("Duration: {seconds:.6}s"),
        None => println!("Duration: {elapsed_ticks} ticks (timer frequency unknown)"),
    }
    for (core, summary) in &report.cores {
        println!(
            "  core {core}: {} events, {} dropped",
            summary.events, summary.dropped
        );
    }
    for (channel, count) in &channels {
        let name = metadata.symbols.get(channel).map_or("?", String::as_str);
        println!("  channel {name} ({channel}): {count} events");
    }

    if report.is_valid() {
        println!("Trace validation successful");
        return Ok(ExitCode::SUCCESS);
    }
    for violation in &report.violations {
        eprintln!("offset {}: {}", violation.offset, violation.message);
    }
    eprintln!("{} violations", report.violations.len());
    Ok(ExitCode::FAILURE)
}
