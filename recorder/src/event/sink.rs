use crate::errors::Result;

pub type BoxedStreamSink = Box<dyn StreamSink>;

/// Interface of the stream port used by the encoder.
///
/// `allocate` and `commit` are called back to back while the recorder's
/// critical section is held, they must not block and must run in bounded
/// time. At most one allocation is pending at any time.
pub trait StreamSink: Send {
    /// Reserves exactly `size` contiguous writable bytes.
    fn allocate(&mut self, size: usize) -> Result<&mut [u8]>;

    /// Publishes the pending allocation, returns the number of bytes
    /// committed. A size that does not match the pending allocation is
    /// rejected and nothing is committed.
    fn commit(&mut self, size: usize) -> usize;

    /// Appends the committed bytes to `out` and frees their space, returns
    /// the number of bytes moved. Runs inside the critical section, so it
    /// must not do any I/O.
    fn take_committed(&mut self, _out: &mut Vec<u8>) -> usize {
        0
    }
}

/// for tests and benchmarks where the data can be dropped
#[derive(Debug, Default)]
pub struct NullStreamSink {
    scratch: Vec<u8>,
    pending: usize,
}

impl StreamSink for NullStreamSink {
    fn allocate(&mut self, size: usize) -> Result<&mut [u8]> {
        self.scratch.resize(size, 0);
        self.pending = size;
        Ok(&mut self.scratch[..])
    }

    fn commit(&mut self, size: usize) -> usize {
        let committed = if size == self.pending { size } else { 0 };
        self.pending = 0;
        committed
    }
}
