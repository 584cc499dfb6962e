use super::StreamSink;
use crate::errors::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use trcstream_transit::{EventRecord, iter_records};

#[derive(Debug, Default)]
pub struct MemSinkState {
    /// size of every allocation request, including the failed ones
    pub allocations: Vec<usize>,
    /// every successful commit, one entry per commit
    pub commits: Vec<Vec<u8>>,
    pub failed_allocations: usize,
    pub rejected_commits: usize,
    fail_next: usize,
}

impl MemSinkState {
    pub fn committed_bytes(&self) -> Vec<u8> {
        self.commits.concat()
    }

    pub fn records(&self) -> anyhow::Result<Vec<EventRecord>> {
        let bytes = self.committed_bytes();
        iter_records(&bytes).collect()
    }
}

/// for tests where we want to inspect the collected data
pub struct InMemorySink {
    pub state: Arc<Mutex<MemSinkState>>,
    scratch: Vec<u8>,
    pending: Option<usize>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemSinkState::default())),
            scratch: Vec::new(),
            pending: None,
        }
    }

    /// Shared view of the recorded activity, stays valid after the sink was
    /// moved into a recorder.
    pub fn state(&self) -> Arc<Mutex<MemSinkState>> {
        self.state.clone()
    }

    /// The next `count` allocations report the sink as full.
    pub fn fail_next_allocations(&self, count: usize) {
        self.lock().fail_next = count;
    }

    fn lock(&self) -> MutexGuard<'_, MemSinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSink for InMemorySink {
    fn allocate(&mut self, size: usize) -> Result<&mut [u8]> {
        self.pending = None;
        {
            let mut state = self.lock();
            state.allocations.push(size);
            if state.fail_next > 0 {
                state.fail_next -= 1;
                state.failed_allocations += 1;
                return Err(Error::SinkFull {
                    requested: size,
                    available: 0,
                });
            }
        }
        self.scratch.clear();
        self.scratch.resize(size, 0);
        self.pending = Some(size);
        Ok(&mut self.scratch[..])
    }

    fn commit(&mut self, size: usize) -> usize {
        let pending = self.pending.take();
        let mut state = self.lock();
        if pending != Some(size) {
            state.rejected_commits += 1;
            return 0;
        }
        state.commits.push(self.scratch[..size].to_vec());
        size
    }

    fn take_committed(&mut self, out: &mut Vec<u8>) -> usize {
        let mut state = self.lock();
        let mut taken = 0;
        for commit in state.commits.drain(..) {
            out.extend_from_slice(&commit);
            taken += commit.len();
        }
        taken
    }
}
