//! Input and output endpoint abstractions.
//!
//! The engine is broker-agnostic: it consumes records from a [`RecordSource`]
//! and publishes sorted batches to a [`RecordSink`]. Connection handling,
//! partitioning and wire batching belong to the endpoint implementations.

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::time::Duration;

/// Streaming source of records.
pub trait RecordSource {
    type Error: Error;

    /// Reads the next record, waiting at most `timeout`.
    ///
    /// `Ok(None)` means the source yielded nothing within the deadline (or is
    /// exhausted); the engine treats it as a drain signal for the current
    /// chunk, never as a failure. `Err` is fatal to the run.
    ///
    /// The returned slice may be invalidated by the next `read` call, so the
    /// borrow is tied to `&mut self` and callers copy what they keep.
    fn read(&mut self, timeout: Duration) -> Result<Option<&[u8]>, Self::Error>;
}

/// Batch publisher for sorted records.
///
/// The engine hands over batches in emission order; preserving that order on
/// the wire is what makes the output totally ordered. Partition placement is
/// entirely the sink's business.
pub trait RecordSink {
    type Error: Error;

    fn publish(&mut self, batch: &[Vec<u8>]) -> Result<(), Self::Error>;
}

/// Source adapter over newline-delimited records from any [`BufRead`].
///
/// Local readers have no drain ambiguity, so the timeout is ignored and EOF
/// is the drain signal.
pub struct ReaderSource<R> {
    reader: R,
    record: Vec<u8>,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        ReaderSource {
            reader,
            record: Vec::new(),
        }
    }
}

impl<R: BufRead> RecordSource for ReaderSource<R> {
    type Error = io::Error;

    fn read(&mut self, _timeout: Duration) -> Result<Option<&[u8]>, io::Error> {
        self.record.clear();
        if self.reader.read_until(b'\n', &mut self.record)? == 0 {
            return Ok(None);
        }
        if self.record.last() == Some(&b'\n') {
            self.record.pop();
        }
        Ok(Some(&self.record))
    }
}

/// Sink adapter writing each record newline-terminated to any [`Write`].
///
/// Flushes once per batch so a slow consumer exerts backpressure at batch
/// granularity.
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        WriterSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for WriterSink<W> {
    type Error = io::Error;

    fn publish(&mut self, batch: &[Vec<u8>]) -> Result<(), io::Error> {
        for record in batch {
            self.writer.write_all(record)?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()
    }
}
