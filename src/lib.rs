//! `topic-sort` is a streaming external merge sort for record topics.
//!
//! External sorting is required when the data being sorted does not fit into the main memory (RAM)
//! of a computer and instead must reside in slower external memory, usually a hard disk drive.
//! Sorting is achieved in two passes: during the first pass budget-bounded chunks of records are
//! pulled from an input endpoint, sorted in memory and spilled to disk; during the second pass the
//! sorted chunks are merged through a min-heap and streamed to an output endpoint in batches. For
//! more information see [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Overview
//!
//! `topic-sort` supports the following features:
//!
//! * **Broker agnostic:**
//!   the engine consumes a [`RecordSource`] and publishes to a [`RecordSink`]; any transport that
//!   can yield and accept record byte buffers plugs in. Newline-delimited reader/writer adapters
//!   are provided.
//! * **Three sort keys:**
//!   records are CSV lines `id,name,address,continent`; runs are ordered by `id` (signed numeric),
//!   `name` or `continent` (unsigned byte-lexicographic), selected per run.
//! * **Adaptive memory budget:**
//!   the per-chunk record budget follows the machine's available memory within configurable
//!   bounds, so a run neither thrashes a small host nor underuses a large one.
//! * **Multithreading support:**
//!   chunks are sorted on a thread pool utilizing maximum CPU resources and reducing sorting time.
//!
//! # Example
//!
//! ```no_run
//! use std::fs;
//! use std::io;
//!
//! use topic_sort::{ExternalSorterBuilder, ReaderSource, SortKey, WriterSink};
//!
//! fn main() {
//!     env_logger::Builder::new().filter_level(log::LevelFilter::Info).init();
//!
//!     let mut source = ReaderSource::new(io::BufReader::new(fs::File::open("input.csv").unwrap()));
//!     let mut sink = WriterSink::new(io::BufWriter::new(fs::File::create("sorted.csv").unwrap()));
//!
//!     let sorter = ExternalSorterBuilder::new()
//!         .with_tmp_dir("./spill".as_ref())
//!         .build()
//!         .unwrap();
//!
//!     let report = sorter.sort(&mut source, &mut sink, SortKey::Id).unwrap();
//!     log::info!("sorted {} records in {} chunks", report.records, report.chunks);
//! }
//! ```

pub mod buffer;
pub mod chunk;
pub mod endpoint;
pub mod key;
pub mod merger;
pub mod sort;

pub use buffer::{RecordBuffer, DEFAULT_CHUNK_CEILING, DEFAULT_CHUNK_FLOOR};
pub use chunk::{ScanCursor, SpillChunk, DEFAULT_IO_BUFFER_SIZE};
pub use endpoint::{ReaderSource, RecordSink, RecordSource, WriterSink};
pub use key::{KeyedRecord, SortKey};
pub use merger::BinaryHeapMerger;
pub use sort::{
    ExternalSorter, ExternalSorterBuilder, SortError, SortReport, DEFAULT_BATCH_SIZE,
    DEFAULT_READ_TIMEOUT,
};
