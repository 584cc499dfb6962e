//! Shared pieces of the `trace-gen` and `validate-trace` tools
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use trcstream_recorder::config::RecorderConfig;

pub mod validation;
pub mod workload;

/// Written next to a capture, everything needed to decode it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceMetadata {
    pub config: RecorderConfig,
    /// ticks per second of the event timestamps, 0 when unknown
    #[serde(default)]
    pub timer_frequency: u64,
    pub symbols: BTreeMap<u32, String>,
}

impl TraceMetadata {
    pub fn ticks_to_seconds(&self, ticks: u64) -> Option<f64> {
        (self.timer_frequency > 0).then(|| ticks as f64 / self.timer_frequency as f64)
    }

    pub fn path_for(trace: &Path) -> PathBuf {
        let mut name = trace.as_os_str().to_owned();
        name.push(".symbols.json");
        PathBuf::from(name)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
    }
}

pub fn try_init_tracing_subscriber() -> Result<()> {
    let env_filter = std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV)
        .map(tracing_subscriber::EnvFilter::new)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    use tracing_subscriber::util::SubscriberInitExt;
    subscriber
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))
}
