use super::StreamSink;
use crate::errors::{Error, Result};

/// Fixed capacity staging buffer, the host equivalent of the recorder's
/// internal event buffer. Committed bytes stay until they are taken.
#[derive(Debug)]
pub struct BoundedBufferSink {
    buffer: Vec<u8>,
    capacity: usize,
    committed: usize,
    pending: usize,
}

impl BoundedBufferSink {
    pub const DEFAULT_CAPACITY: usize = 64 * 1024;

    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            committed: 0,
            pending: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.capacity - self.committed
    }

    pub fn committed_bytes(&self) -> &[u8] {
        &self.buffer[..self.committed]
    }
}

impl Default for BoundedBufferSink {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl StreamSink for BoundedBufferSink {
    fn allocate(&mut self, size: usize) -> Result<&mut [u8]> {
        // an allocation that was never committed is discarded
        self.buffer.truncate(self.committed);
        self.pending = 0;
        if size > self.available() {
            return Err(Error::SinkFull {
                requested: size,
                available: self.available(),
            });
        }
        self.buffer.resize(self.committed + size, 0);
        self.pending = size;
        Ok(&mut self.buffer[self.committed..])
    }

    fn commit(&mut self, size: usize) -> usize {
        if self.pending == 0 || size != self.pending {
            self.buffer.truncate(self.committed);
            self.pending = 0;
            return 0;
        }
        self.committed += size;
        self.pending = 0;
        size
    }

    fn take_committed(&mut self, out: &mut Vec<u8>) -> usize {
        let taken = self.committed;
        out.extend_from_slice(&self.buffer[..taken]);
        self.buffer.clear();
        self.committed = 0;
        self.pending = 0;
        taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_commit() {
        let mut sink = BoundedBufferSink::new(8);
        sink.allocate(3).unwrap().copy_from_slice(b"abc");
        assert_eq!(sink.commit(3), 3);
        assert_eq!(sink.committed_bytes(), b"abc");
        assert_eq!(sink.available(), 5);
    }

    #[test]
    fn test_full() {
        let mut sink = BoundedBufferSink::new(4);
        assert_eq!(
            sink.allocate(5).unwrap_err(),
            Error::SinkFull {
                requested: 5,
                available: 4
            }
        );
        assert!(sink.committed_bytes().is_empty());
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let mut sink = BoundedBufferSink::new(8);
        sink.allocate(4).unwrap().copy_from_slice(b"wxyz");
        assert_eq!(sink.commit(3), 0);
        assert!(sink.committed_bytes().is_empty());
        // nothing pending anymore
        assert_eq!(sink.commit(4), 0);
    }

    #[test]
    fn test_uncommitted_allocation_discarded() {
        let mut sink = BoundedBufferSink::new(8);
        sink.allocate(6).unwrap().fill(b'x');
        sink.allocate(2).unwrap().copy_from_slice(b"ok");
        assert_eq!(sink.commit(2), 2);
        assert_eq!(sink.committed_bytes(), b"ok");
    }

    #[test]
    fn test_take_committed_frees_space() {
        let mut sink = BoundedBufferSink::new(4);
        sink.allocate(4).unwrap().copy_from_slice(b"full");
        sink.commit(4);
        assert!(sink.allocate(1).is_err());
        let mut out = Vec::new();
        assert_eq!(sink.take_committed(&mut out), 4);
        assert_eq!(out, b"full");
        assert_eq!(sink.available(), 4);
    }
}
