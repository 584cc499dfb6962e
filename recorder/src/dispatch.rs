//! Process-wide recorder used by [`crate::trace_printf`]
pub use crate::errors::{Error, Result};
use crate::args::TraceArg;
use crate::recorder::{Channel, EncodeOutcome, Recorder};
use std::sync::{Arc, PoisonError, RwLock};

lazy_static! {
    static ref G_RECORDER: RwLock<Option<Arc<Recorder>>> = RwLock::new(None);
}

pub fn init_recorder(recorder: Recorder) -> Result<()> {
    let mut installed = G_RECORDER.write().unwrap_or_else(PoisonError::into_inner);
    if installed.is_some() {
        log::warn!("recorder already initialized");
        return Err(Error::AlreadyInitialized);
    }
    *installed = Some(Arc::new(recorder));
    Ok(())
}

/// Uninstalls the global recorder and hands it back, so that the data it
/// still holds can be transferred.
pub fn shutdown_recorder() -> Option<Arc<Recorder>> {
    G_RECORDER
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
}

#[inline]
pub fn get_recorder() -> Option<Arc<Recorder>> {
    G_RECORDER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

pub fn with_recorder<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&Recorder) -> R,
{
    get_recorder().map(|recorder| f(&recorder))
}

#[inline(always)]
pub fn printf(format: &str, args: &[TraceArg<'_>]) -> Result<EncodeOutcome> {
    match get_recorder() {
        Some(recorder) => recorder.printf(format, args),
        None => Ok(EncodeOutcome::Disabled),
    }
}

#[inline(always)]
pub fn printf_channel(
    channel: Channel,
    format: &str,
    args: &[TraceArg<'_>],
) -> Result<EncodeOutcome> {
    match get_recorder() {
        Some(recorder) => recorder.printf_channel(channel, format, args),
        None => Ok(EncodeOutcome::Disabled),
    }
}

pub fn register_channel(name: &str) -> Result<Channel> {
    with_recorder(|recorder| recorder.register_channel(name)).unwrap_or(Err(Error::NotInitialized))
}

pub fn enable() {
    with_recorder(Recorder::enable);
}

pub fn disable() {
    with_recorder(Recorder::disable);
}

pub fn is_enabled() -> bool {
    with_recorder(Recorder::is_enabled).unwrap_or(false)
}
