//! On-disk spill chunks.
//!
//! A spill chunk is one sorted run persisted as newline-terminated records:
//! no header, no framing beyond the `\n` terminator. Chunks are scratch data;
//! writes are flushed but never fsynced, since a crash voids the whole run.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default read/write buffer size for spill files. Large buffers keep
/// syscall counts low on multi-gigabyte runs.
pub const DEFAULT_IO_BUFFER_SIZE: usize = 4 << 20;

/// Handle to one spill file, named `chunk_<index>.tmp` inside the run's
/// temp directory.
#[derive(Debug)]
pub struct SpillChunk {
    path: PathBuf,
}

impl SpillChunk {
    /// Writes `records` in iteration order, each followed by a single `\n`.
    /// Callers pass records already sorted; the store never inspects them.
    pub fn create<I>(dir: &Path, index: usize, records: I, buf_size: usize) -> io::Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let path = dir.join(format!("chunk_{}.tmp", index));
        let file = File::create(&path)?;

        let mut writer = BufWriter::with_capacity(buf_size, file);
        for record in records {
            writer.write_all(record.as_ref())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        Ok(SpillChunk { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a streaming cursor over the chunk's records.
    pub fn scan(&self, buf_size: usize) -> io::Result<ScanCursor> {
        let file = File::open(&self.path)?;
        Ok(ScanCursor {
            reader: BufReader::with_capacity(buf_size, file),
        })
    }

    /// Deletes the spill file.
    pub fn remove(self) -> io::Result<()> {
        fs::remove_file(&self.path)
    }
}

/// Buffered record-by-record reader over a spill chunk.
pub struct ScanCursor {
    reader: BufReader<File>,
}

impl Iterator for ScanCursor {
    type Item = io::Result<Vec<u8>>;

    /// Returns the next record with the trailing `\n` stripped. A final
    /// record without a terminator is still yielded.
    fn next(&mut self) -> Option<Self::Item> {
        let mut record = Vec::new();
        match self.reader.read_until(b'\n', &mut record) {
            Ok(0) => None,
            Ok(_) => {
                if record.last() == Some(&b'\n') {
                    record.pop();
                }
                Some(Ok(record))
            }
            Err(err) => Some(Err(err)),
        }
    }
}
