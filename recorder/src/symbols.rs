//! Symbol table: strings are registered once and referenced by a small handle.
//!
//! Entries are reference counted, an entry disappears when its last reference
//! is released. Names are interned with [`ArcIntern`] so registering a live
//! string again yields the same handle.
use crate::errors::{Error, Result};
use internment::ArcIntern;
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU32;
use std::sync::{Mutex, MutexGuard, PoisonError};
use trcstream_transit::SymbolLookup;

/// Reference to a registered string, never 0 on the wire
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct SymbolHandle(NonZeroU32);

impl SymbolHandle {
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Registration interface used by the encoder.
///
/// Both operations may be called concurrently from any context and must
/// complete in bounded time.
pub trait SymbolInterner: Send + Sync {
    fn register(&self, name: &str) -> Result<SymbolHandle>;
    fn release(&self, handle: SymbolHandle);
}

#[derive(Debug)]
struct SymbolEntry {
    name: ArcIntern<String>,
    ref_count: u32,
}

#[derive(Debug)]
struct SymbolTableState {
    entries: HashMap<u32, SymbolEntry>,
    by_name: HashMap<ArcIntern<String>, u32>,
    next_handle: u32,
    history: Option<SymbolHistory>,
}

/// Every name a handle was ever assigned to, in both directions
#[derive(Debug, Default)]
struct SymbolHistory {
    names: HashMap<u32, ArcIntern<String>>,
    handles: HashMap<ArcIntern<String>, u32>,
}

impl SymbolTableState {
    /// A released name gets its previous handle back when history is kept,
    /// so a handle only ever designates one string.
    fn allocate_handle(&mut self, name: &ArcIntern<String>) -> u32 {
        if let Some(&handle) = self
            .history
            .as_ref()
            .and_then(|history| history.handles.get(name))
        {
            return handle;
        }
        loop {
            let candidate = self.next_handle;
            self.next_handle = self.next_handle.wrapping_add(1).max(1);
            let retired = self
                .history
                .as_ref()
                .is_some_and(|history| history.names.contains_key(&candidate));
            if !self.entries.contains_key(&candidate) && !retired {
                return candidate;
            }
        }
    }
}

#[derive(Debug)]
pub struct SymbolTable {
    capacity: usize,
    state: Mutex<SymbolTableState>,
}

impl SymbolTable {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(SymbolTableState {
                entries: HashMap::new(),
                by_name: HashMap::new(),
                next_handle: 1,
                history: None,
            }),
        }
    }

    /// Keeps the name of every handle ever assigned so that streams can be
    /// rendered after the entries were released.
    #[must_use]
    pub fn with_history(self) -> Self {
        self.lock().history = Some(SymbolHistory::default());
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn live_count(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn ref_count(&self, handle: u32) -> Option<u32> {
        self.lock().entries.get(&handle).map(|entry| entry.ref_count)
    }

    /// Name of a live entry, or of a released one when history is kept.
    pub fn resolve(&self, handle: u32) -> Option<String> {
        let state = self.lock();
        if let Some(entry) = state.entries.get(&handle) {
            return Some((*entry.name).clone());
        }
        state
            .history
            .as_ref()
            .and_then(|history| history.names.get(&handle))
            .map(|name| (**name).clone())
    }

    /// Every resolvable handle, sorted.
    pub fn snapshot(&self) -> BTreeMap<u32, String> {
        let state = self.lock();
        let mut symbols: BTreeMap<u32, String> = state
            .history
            .iter()
            .flat_map(|history| history.names.iter())
            .map(|(handle, name)| (*handle, (**name).clone()))
            .collect();
        for (handle, entry) in &state.entries {
            symbols.insert(*handle, (*entry.name).clone());
        }
        symbols
    }

    fn lock(&self) -> MutexGuard<'_, SymbolTableState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl SymbolInterner for SymbolTable {
    fn register(&self, name: &str) -> Result<SymbolHandle> {
        if name.contains('\0') {
            return Err(Error::InvalidSymbol);
        }
        let key = ArcIntern::new(name.to_owned());
        let mut state = self.lock();
        if let Some(&handle) = state.by_name.get(&key) {
            if let Some(entry) = state.entries.get_mut(&handle) {
                entry.ref_count += 1;
                return SymbolHandle::new(handle).ok_or(Error::InvalidSymbol);
            }
        }
        if state.entries.len() >= self.capacity {
            return Err(Error::SymbolTableFull {
                capacity: self.capacity,
            });
        }
        let handle = state.allocate_handle(&key);
        state.by_name.insert(key.clone(), handle);
        if let Some(history) = state.history.as_mut() {
            history.names.insert(handle, key.clone());
            history.handles.insert(key.clone(), handle);
        }
        state.entries.insert(
            handle,
            SymbolEntry {
                name: key,
                ref_count: 1,
            },
        );
        SymbolHandle::new(handle).ok_or(Error::InvalidSymbol)
    }

    fn release(&self, handle: SymbolHandle) {
        let mut state = self.lock();
        let raw = handle.get();
        let Some(entry) = state.entries.get_mut(&raw) else {
            log::warn!("release of unknown symbol {raw}");
            return;
        };
        entry.ref_count -= 1;
        if entry.ref_count == 0 {
            if let Some(entry) = state.entries.remove(&raw) {
                state.by_name.remove(&entry.name);
            }
        }
    }
}

impl SymbolLookup for SymbolTable {
    fn symbol(&self, handle: u32) -> Option<String> {
        self.resolve(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_release() {
        let table = SymbolTable::new(4);
        let motor = table.register("motor").unwrap();
        let again = table.register("motor").unwrap();
        assert_eq!(motor, again);
        assert_eq!(table.ref_count(motor.get()), Some(2));
        assert_eq!(table.resolve(motor.get()).as_deref(), Some("motor"));

        table.release(motor);
        assert_eq!(table.ref_count(motor.get()), Some(1));
        table.release(again);
        assert_eq!(table.ref_count(motor.get()), None);
        assert_eq!(table.live_count(), 0);
        assert_eq!(table.resolve(motor.get()), None);
    }

    #[test]
    fn test_handles_not_reused() {
        let table = SymbolTable::new(4);
        let first = table.register("a").unwrap();
        table.release(first);
        let second = table.register("a").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_capacity() {
        let table = SymbolTable::new(2);
        let a = table.register("a").unwrap();
        let _b = table.register("b").unwrap();
        assert_eq!(
            table.register("c"),
            Err(Error::SymbolTableFull { capacity: 2 })
        );
        // a live name does not need a new entry
        assert!(table.register("a").is_ok());
        table.release(a);
        table.release(a);
        assert!(table.register("c").is_ok());
    }

    #[test]
    fn test_invalid_symbol() {
        let table = SymbolTable::default();
        assert_eq!(table.register("bad\0name"), Err(Error::InvalidSymbol));
        assert_eq!(table.live_count(), 0);
    }

    #[test]
    fn test_history() {
        let table = SymbolTable::new(4).with_history();
        let gone = table.register("gone").unwrap();
        let kept = table.register("kept").unwrap();
        table.release(gone);
        assert_eq!(table.resolve(gone.get()).as_deref(), Some("gone"));
        let snapshot = table.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[&kept.get()], "kept");
        assert_eq!(table.symbol(gone.get()).as_deref(), Some("gone"));
    }

    #[test]
    fn test_history_reuses_handle_of_released_name() {
        let table = SymbolTable::new(4).with_history();
        let first = table.register("worker-0").unwrap();
        table.release(first);
        for _ in 0..1000 {
            let again = table.register("worker-0").unwrap();
            assert_eq!(again, first);
            table.release(again);
        }
        let other = table.register("worker-1").unwrap();
        assert_ne!(other, first);
        assert_eq!(table.snapshot().len(), 2);
        assert_eq!(table.live_count(), 1);
    }
}
