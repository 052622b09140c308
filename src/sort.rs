//! External sorter.

use std::cmp::Ordering;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use rayon::slice::ParallelSliceMut;

use crate::buffer::{self, RecordBuffer, DEFAULT_CHUNK_CEILING, DEFAULT_CHUNK_FLOOR};
use crate::chunk::{SpillChunk, DEFAULT_IO_BUFFER_SIZE};
use crate::endpoint::{RecordSink, RecordSource};
use crate::key::{self, KeyedRecord, SortKey};
use crate::merger::BinaryHeapMerger;

/// Per-chunk drain deadline: how long a chunk keeps waiting for input before
/// it is treated as the last one.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);
/// Records per publish batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Sorting error.
#[derive(Debug)]
pub enum SortError<I: Error = io::Error, O: Error = io::Error> {
    /// Temporary directory creation error.
    TempDir(io::Error),
    /// Workers thread pool initialization error.
    ThreadPoolBuildError(rayon::ThreadPoolBuildError),
    /// Spill file I/O error.
    Spill(io::Error),
    /// Fatal input endpoint error.
    Input(I),
    /// Output endpoint publish error.
    Output(O),
}

impl<I, O> Error for SortError<I, O>
where
    I: Error + 'static,
    O: Error + 'static,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(match &self {
            SortError::TempDir(err) => err,
            SortError::ThreadPoolBuildError(err) => err,
            SortError::Spill(err) => err,
            SortError::Input(err) => err,
            SortError::Output(err) => err,
        })
    }
}

impl<I: Error, O: Error> Display for SortError<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::TempDir(err) => write!(f, "temporary directory not created: {}", err),
            SortError::ThreadPoolBuildError(err) => write!(f, "thread pool initialization failed: {}", err),
            SortError::Spill(err) => write!(f, "spill file I/O failed: {}", err),
            SortError::Input(err) => write!(f, "input endpoint failed: {}", err),
            SortError::Output(err) => write!(f, "output endpoint failed: {}", err),
        }
    }
}

/// Per-phase counters and timings of one completed run.
#[derive(Debug, Clone, Default)]
pub struct SortReport {
    /// Records published to the output endpoint.
    pub records: u64,
    /// Spill chunks produced during the chunk phase.
    pub chunks: usize,
    pub chunk_elapsed: Duration,
    pub merge_elapsed: Duration,
}

/// External sorter builder. Provides methods for [`ExternalSorter`] initialization.
#[derive(Debug, Clone)]
pub struct ExternalSorterBuilder {
    /// Number of threads to be used to sort chunks in parallel.
    threads_number: Option<usize>,
    /// Parent directory for the run's spill files.
    tmp_dir: Option<Box<Path>>,
    /// Bounds on the adaptive per-chunk record budget.
    chunk_floor: usize,
    chunk_ceiling: usize,
    /// Per-chunk input drain deadline.
    read_timeout: Duration,
    /// Records per publish batch.
    batch_size: usize,
    /// Spill file read/write buffer size.
    io_buffer_size: usize,
}

impl ExternalSorterBuilder {
    /// Creates an instance of a builder with default parameters.
    pub fn new() -> Self {
        ExternalSorterBuilder::default()
    }

    /// Builds an [`ExternalSorter`] instance using provided configuration.
    pub fn build(self) -> Result<ExternalSorter, SortError> {
        ExternalSorter::new(
            self.threads_number,
            self.tmp_dir.as_deref(),
            self.chunk_floor,
            self.chunk_ceiling,
            self.read_timeout,
            self.batch_size,
            self.io_buffer_size,
        )
    }

    /// Sets the number of threads used to sort chunks in parallel.
    pub fn with_threads_number(mut self, threads_number: usize) -> ExternalSorterBuilder {
        self.threads_number = Some(threads_number);
        return self;
    }

    /// Sets the parent directory for spill files. Each run creates its own
    /// private directory inside it, so concurrent runs never collide.
    pub fn with_tmp_dir(mut self, path: &Path) -> ExternalSorterBuilder {
        self.tmp_dir = Some(path.into());
        return self;
    }

    /// Sets the bounds on the adaptive per-chunk record budget. A ceiling
    /// below the floor is raised to it.
    pub fn with_chunk_bounds(mut self, floor: usize, ceiling: usize) -> ExternalSorterBuilder {
        self.chunk_floor = floor.max(1);
        self.chunk_ceiling = ceiling.max(self.chunk_floor);
        return self;
    }

    /// Sets how long a chunk waits for input before treating the topic as
    /// drained.
    pub fn with_read_timeout(mut self, timeout: Duration) -> ExternalSorterBuilder {
        self.read_timeout = timeout;
        return self;
    }

    /// Sets the number of records per publish batch.
    pub fn with_batch_size(mut self, batch_size: usize) -> ExternalSorterBuilder {
        self.batch_size = batch_size.max(1);
        return self;
    }

    /// Sets the spill file read/write buffer size.
    pub fn with_io_buffer_size(mut self, buf_size: usize) -> ExternalSorterBuilder {
        self.io_buffer_size = buf_size.max(1);
        return self;
    }
}

impl Default for ExternalSorterBuilder {
    fn default() -> Self {
        ExternalSorterBuilder {
            threads_number: None,
            tmp_dir: None,
            chunk_floor: DEFAULT_CHUNK_FLOOR,
            chunk_ceiling: DEFAULT_CHUNK_CEILING,
            read_timeout: DEFAULT_READ_TIMEOUT,
            batch_size: DEFAULT_BATCH_SIZE,
            io_buffer_size: DEFAULT_IO_BUFFER_SIZE,
        }
    }
}

/// Two-phase external sorter between an input and an output endpoint.
///
/// Phase one drains the input into budget-bounded chunks, sorts each chunk in
/// memory by its pre-extracted keys and spills it to disk. Phase two streams
/// a k-way merge of the spill files to the output endpoint in batches.
pub struct ExternalSorter {
    /// Sorting thread pool.
    thread_pool: rayon::ThreadPool,
    /// Run-private directory holding the spill files.
    tmp_dir: tempfile::TempDir,
    chunk_floor: usize,
    chunk_ceiling: usize,
    read_timeout: Duration,
    batch_size: usize,
    io_buffer_size: usize,
}

impl ExternalSorter {
    /// Creates a new external sorter instance.
    ///
    /// # Arguments
    /// * `threads_number` - Number of threads used to sort chunks in parallel. If the parameter
    ///   is [`None`] the thread count is selected based on available CPU core number.
    /// * `tmp_path` - Parent directory for the run's spill files. If the parameter is [`None`]
    ///   the default OS temporary directory is used.
    /// * `chunk_floor` / `chunk_ceiling` - Bounds on the adaptive per-chunk record budget.
    /// * `read_timeout` - Per-chunk input drain deadline.
    /// * `batch_size` - Records per publish batch.
    /// * `io_buffer_size` - Spill file read/write buffer size.
    pub fn new(
        threads_number: Option<usize>,
        tmp_path: Option<&Path>,
        chunk_floor: usize,
        chunk_ceiling: usize,
        read_timeout: Duration,
        batch_size: usize,
        io_buffer_size: usize,
    ) -> Result<Self, SortError> {
        return Ok(ExternalSorter {
            thread_pool: Self::init_thread_pool(threads_number)?,
            tmp_dir: Self::init_tmp_directory(tmp_path)?,
            chunk_floor,
            chunk_ceiling,
            read_timeout,
            batch_size,
            io_buffer_size,
        });
    }

    fn init_thread_pool(threads_number: Option<usize>) -> Result<rayon::ThreadPool, SortError> {
        let mut thread_pool_builder = rayon::ThreadPoolBuilder::new();

        if let Some(threads_number) = threads_number {
            log::info!("initializing thread-pool (threads: {})", threads_number);
            thread_pool_builder = thread_pool_builder.num_threads(threads_number);
        } else {
            log::info!("initializing thread-pool (threads: default)");
        }
        let thread_pool = thread_pool_builder
            .build()
            .map_err(SortError::ThreadPoolBuildError)?;

        return Ok(thread_pool);
    }

    fn init_tmp_directory(tmp_path: Option<&Path>) -> Result<tempfile::TempDir, SortError> {
        let tmp_dir = if let Some(tmp_path) = tmp_path {
            std::fs::create_dir_all(tmp_path)
                .and_then(|_| tempfile::tempdir_in(tmp_path))
        } else {
            tempfile::tempdir()
        }
        .map_err(SortError::TempDir)?;

        log::info!("using {} as a spill directory", tmp_dir.path().display());

        return Ok(tmp_dir);
    }

    /// Drains `source`, totally orders the records by `selector` and
    /// publishes them to `sink`.
    ///
    /// An input that yields nothing at all is a successful run with zero
    /// chunks and zero emissions. Spill files are removed on success; on
    /// failure the run's private directory is reclaimed when the sorter is
    /// dropped.
    pub fn sort<S, K>(
        &self,
        source: &mut S,
        sink: &mut K,
        selector: SortKey,
    ) -> Result<SortReport, SortError<S::Error, K::Error>>
    where
        S: RecordSource,
        K: RecordSink,
    {
        // The comparator is resolved here, once per run; chunk sort and merge
        // both reuse it.
        let compare = key::compare;
        let budget = buffer::adaptive_budget(self.chunk_floor, self.chunk_ceiling);
        log::info!("sorting by {} with a budget of {} records per chunk", selector, budget);

        let chunk_started = Instant::now();
        let mut chunks = Vec::new();
        let mut records_read: u64 = 0;

        loop {
            let (chunk_buf, drained) = self.fill_chunk(source, selector, budget)?;
            if chunk_buf.is_empty() {
                break;
            }

            records_read += chunk_buf.len() as u64;
            let count = chunk_buf.len();
            let chunk = self
                .spill(chunks.len(), chunk_buf, compare)
                .map_err(SortError::Spill)?;
            log::info!(
                "chunk {}: sorted {} records, spilled to {}",
                chunks.len(),
                count,
                chunk.path().display(),
            );
            chunks.push(chunk);

            if drained {
                break;
            }
        }

        let chunk_elapsed = chunk_started.elapsed();
        log::info!(
            "chunk phase done: {} chunks, {} records in {:?}",
            chunks.len(),
            records_read,
            chunk_elapsed,
        );

        if chunks.is_empty() {
            return Ok(SortReport {
                chunk_elapsed,
                ..SortReport::default()
            });
        }

        let merge_started = Instant::now();
        let merged = self.merge(&chunks, sink, selector, compare)?;
        let merge_elapsed = merge_started.elapsed();
        log::info!(
            "merge phase done: {} records from {} chunks in {:?}",
            merged,
            chunks.len(),
            merge_elapsed,
        );

        let chunk_count = chunks.len();
        for chunk in chunks {
            // spill files are scratch, a failed removal is not worth failing the run
            let _ = chunk.remove();
        }

        return Ok(SortReport {
            records: merged,
            chunks: chunk_count,
            chunk_elapsed,
            merge_elapsed,
        });
    }

    /// Reads records into a fresh chunk buffer until it fills, the per-chunk
    /// deadline expires or the source reports a drain. The flag is true when
    /// the chunk ended early and the phase should stop after spilling it.
    fn fill_chunk<S, O>(
        &self,
        source: &mut S,
        selector: SortKey,
        budget: usize,
    ) -> Result<(RecordBuffer<KeyedRecord>, bool), SortError<S::Error, O>>
    where
        S: RecordSource,
        O: Error,
    {
        let mut chunk_buf = RecordBuffer::new(budget);
        let deadline = Instant::now() + self.read_timeout;

        while !chunk_buf.is_full() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok((chunk_buf, true));
            }

            match source.read(remaining) {
                // The source may recycle its buffer on the next read, so the
                // payload is copied into an engine-owned allocation.
                Ok(Some(payload)) => chunk_buf.push(KeyedRecord::new(payload.to_vec(), selector)),
                Ok(None) => return Ok((chunk_buf, true)),
                Err(err) => return Err(SortError::Input(err)),
            }
        }

        return Ok((chunk_buf, false));
    }

    /// Sorts a chunk in place on the thread pool and writes it out.
    fn spill<F>(
        &self,
        index: usize,
        mut chunk_buf: RecordBuffer<KeyedRecord>,
        compare: F,
    ) -> io::Result<SpillChunk>
    where
        F: Fn(&KeyedRecord, &KeyedRecord) -> Ordering + Sync,
    {
        self.thread_pool
            .install(|| chunk_buf.as_mut_slice().par_sort_unstable_by(&compare));

        SpillChunk::create(
            self.tmp_dir.path(),
            index,
            chunk_buf.into_iter().map(KeyedRecord::into_data),
            self.io_buffer_size,
        )
        .map_err(|err| {
            log::error!("spilling chunk {} failed: {}", index, err);
            err
        })
    }

    /// Streams the k-way merge of all spill chunks into the sink in batches.
    fn merge<I, K, F>(
        &self,
        chunks: &[SpillChunk],
        sink: &mut K,
        selector: SortKey,
        compare: F,
    ) -> Result<u64, SortError<I, K::Error>>
    where
        I: Error,
        K: RecordSink,
        F: Fn(&KeyedRecord, &KeyedRecord) -> Ordering + Copy,
    {
        let mut cursors = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let cursor = chunk.scan(self.io_buffer_size).map_err(|err| {
                log::error!("opening {} failed: {}", chunk.path().display(), err);
                SortError::Spill(err)
            })?;
            cursors.push(cursor);
        }

        let merger = BinaryHeapMerger::new(cursors, selector, compare);
        let mut batch = Vec::with_capacity(self.batch_size);
        let mut merged: u64 = 0;

        for record in merger {
            batch.push(record.map_err(SortError::Spill)?);
            merged += 1;

            if batch.len() >= self.batch_size {
                sink.publish(&batch).map_err(SortError::Output)?;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            sink.publish(&batch).map_err(SortError::Output)?;
        }

        return Ok(merged);
    }
}

#[cfg(test)]
mod test {
    use std::collections::VecDeque;
    use std::io;
    use std::path::Path;
    use std::time::Duration;

    use rand::seq::SliceRandom;
    use rand::Rng;
    use rstest::*;

    use crate::endpoint::{RecordSink, RecordSource};
    use crate::key::{self, KeyedRecord, SortKey};

    use super::{ExternalSorter, ExternalSorterBuilder, SortError, SortReport};

    /// Queue-backed source: yields its records in arrival order, then drains.
    struct MemorySource {
        records: VecDeque<Vec<u8>>,
        current: Vec<u8>,
    }

    impl MemorySource {
        fn new<'a>(records: impl IntoIterator<Item = &'a [u8]>) -> Self {
            MemorySource {
                records: records.into_iter().map(<[u8]>::to_vec).collect(),
                current: Vec::new(),
            }
        }
    }

    impl RecordSource for MemorySource {
        type Error = io::Error;

        fn read(&mut self, _timeout: Duration) -> Result<Option<&[u8]>, io::Error> {
            match self.records.pop_front() {
                Some(record) => {
                    self.current = record;
                    Ok(Some(&self.current))
                }
                None => Ok(None),
            }
        }
    }

    /// Source that fails fatally after yielding its records.
    struct FailingSource {
        inner: MemorySource,
    }

    impl RecordSource for FailingSource {
        type Error = io::Error;

        fn read(&mut self, timeout: Duration) -> Result<Option<&[u8]>, io::Error> {
            if self.inner.read(timeout)?.is_none() {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "broker gone"));
            }
            Ok(Some(&self.inner.current))
        }
    }

    #[derive(Default)]
    struct MemorySink {
        records: Vec<Vec<u8>>,
        batch_sizes: Vec<usize>,
    }

    impl RecordSink for MemorySink {
        type Error = io::Error;

        fn publish(&mut self, batch: &[Vec<u8>]) -> Result<(), io::Error> {
            self.batch_sizes.push(batch.len());
            self.records.extend_from_slice(batch);
            Ok(())
        }
    }

    struct FailingSink;

    impl RecordSink for FailingSink {
        type Error = io::Error;

        fn publish(&mut self, _batch: &[Vec<u8>]) -> Result<(), io::Error> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "publish rejected"))
        }
    }

    fn sorter(tmp_dir: &Path, bounds: (usize, usize), batch_size: usize) -> ExternalSorter {
        ExternalSorterBuilder::new()
            .with_tmp_dir(tmp_dir)
            .with_chunk_bounds(bounds.0, bounds.1)
            .with_batch_size(batch_size)
            .with_threads_number(2)
            .with_io_buffer_size(64 * 1024)
            .build()
            .unwrap()
    }

    fn run(records: &[&[u8]], selector: SortKey, bounds: (usize, usize)) -> (SortReport, MemorySink) {
        let tmp_dir = tempfile::tempdir().unwrap();
        let sorter = sorter(tmp_dir.path(), bounds, 1000);

        let mut source = MemorySource::new(records.iter().copied());
        let mut sink = MemorySink::default();
        let report = sorter.sort(&mut source, &mut sink, selector).unwrap();

        (report, sink)
    }

    #[rstest]
    fn test_sort_by_id_with_negative_ids() {
        let input: Vec<&[u8]> = vec![
            b"5,bob,addr1,Asia",
            b"-3,ann,addr2,Europe",
            b"42,bob,addr3,Asia",
            b"0,zed,addr4,Africa",
        ];
        let (report, sink) = run(&input, SortKey::Id, (4, 4));

        let expected: Vec<&[u8]> = vec![
            b"-3,ann,addr2,Europe",
            b"0,zed,addr4,Africa",
            b"5,bob,addr1,Asia",
            b"42,bob,addr3,Asia",
        ];
        assert_eq!(sink.records, expected);
        assert_eq!(report.records, 4);
        assert_eq!(report.chunks, 1);
    }

    #[rstest]
    fn test_sort_by_name_is_byte_lexicographic() {
        let input: Vec<&[u8]> = vec![
            b"1,alpha,x,Asia",
            b"2,alphabet,x,Asia",
            b"3,alp,x,Asia",
            b"4,Alpha,x,Asia",
        ];
        let (_, sink) = run(&input, SortKey::Name, (2, 2));

        let expected: Vec<&[u8]> = vec![
            b"4,Alpha,x,Asia",
            b"3,alp,x,Asia",
            b"1,alpha,x,Asia",
            b"2,alphabet,x,Asia",
        ];
        assert_eq!(sink.records, expected);
    }

    #[rstest]
    fn test_sort_by_continent_uses_last_field() {
        let input: Vec<&[u8]> = vec![b"1,a,xxx,Oceania", b"2,b,yy,Africa", b"3,c,zzz,Asia"];
        let (_, sink) = run(&input, SortKey::Continent, (3, 3));

        let expected: Vec<&[u8]> = vec![b"2,b,yy,Africa", b"3,c,zzz,Asia", b"1,a,xxx,Oceania"];
        assert_eq!(sink.records, expected);
    }

    #[rstest]
    fn test_multiple_chunks_with_partial_tail() {
        let input: Vec<&[u8]> = vec![
            b"7,a,x,Asia",
            b"2,b,x,Asia",
            b"9,c,x,Asia",
            b"1,d,x,Asia",
            b"8,e,x,Asia",
            b"3,f,x,Asia",
            b"6,g,x,Asia",
            b"4,h,x,Asia",
            b"5,i,x,Asia",
            b"0,j,x,Asia",
        ];
        let (report, sink) = run(&input, SortKey::Id, (3, 3));

        assert_eq!(report.chunks, 4);
        assert_eq!(report.records, 10);

        let ids: Vec<i64> = sink
            .records
            .iter()
            .map(|r| std::str::from_utf8(&r[..r.iter().position(|&b| b == b',').unwrap()])
                .unwrap()
                .parse()
                .unwrap())
            .collect();
        assert_eq!(ids, Vec::from_iter(0..10));
    }

    #[rstest]
    fn test_empty_input_is_success() {
        let (report, sink) = run(&[], SortKey::Id, (3, 3));

        assert_eq!(report.records, 0);
        assert_eq!(report.chunks, 0);
        assert!(sink.records.is_empty());
        assert!(sink.batch_sizes.is_empty());
    }

    #[rstest]
    fn test_duplicate_keys_are_all_emitted() {
        let input: Vec<&[u8]> = vec![
            b"5,ann,x,Asia",
            b"5,bob,x,Asia",
            b"5,cid,x,Asia",
            b"5,dot,x,Asia",
            b"5,eve,x,Asia",
        ];
        let (report, sink) = run(&input, SortKey::Id, (2, 2));

        assert_eq!(report.records, 5);
        let mut emitted = sink.records.clone();
        emitted.sort();
        let mut expected: Vec<Vec<u8>> = input.iter().map(|r| r.to_vec()).collect();
        expected.sort();
        assert_eq!(emitted, expected);
    }

    #[rstest]
    fn test_publish_batches_are_capped() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let sorter = sorter(tmp_dir.path(), (10, 10), 2);

        let input: Vec<&[u8]> = vec![
            b"3,a,x,Asia",
            b"1,b,x,Asia",
            b"4,c,x,Asia",
            b"2,d,x,Asia",
            b"5,e,x,Asia",
        ];
        let mut source = MemorySource::new(input);
        let mut sink = MemorySink::default();
        sorter.sort(&mut source, &mut sink, SortKey::Id).unwrap();

        assert_eq!(sink.batch_sizes, vec![2, 2, 1]);
    }

    #[rstest]
    fn test_spill_files_are_removed_after_success() {
        let parent = tempfile::tempdir().unwrap();
        {
            let sorter = sorter(parent.path(), (2, 2), 1000);
            let input: Vec<&[u8]> = vec![b"3,a,x,Asia", b"1,b,x,Asia", b"2,c,x,Asia"];
            let mut source = MemorySource::new(input);
            let mut sink = MemorySink::default();
            sorter.sort(&mut source, &mut sink, SortKey::Id).unwrap();

            assert!(no_chunk_files(parent.path()));
        }
        // dropping the sorter reclaims the run directory itself
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    fn no_chunk_files(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().all(|entry| {
            let entry = entry.unwrap();
            if entry.file_type().unwrap().is_dir() {
                no_chunk_files(&entry.path())
            } else {
                !entry.file_name().to_string_lossy().starts_with("chunk_")
            }
        })
    }

    #[rstest]
    fn test_fatal_input_error_is_surfaced() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let sorter = sorter(tmp_dir.path(), (10, 10), 1000);

        let mut source = FailingSource {
            inner: MemorySource::new([b"1,a,x,Asia" as &[u8]]),
        };
        let mut sink = MemorySink::default();
        let err = sorter.sort(&mut source, &mut sink, SortKey::Id).unwrap_err();

        assert!(matches!(err, SortError::Input(_)));
        assert!(sink.records.is_empty());
    }

    #[rstest]
    fn test_publish_error_is_surfaced() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let sorter = sorter(tmp_dir.path(), (2, 2), 1000);

        let input: Vec<&[u8]> = vec![b"2,a,x,Asia", b"1,b,x,Asia"];
        let mut source = MemorySource::new(input);
        let err = sorter.sort(&mut source, &mut FailingSink, SortKey::Id).unwrap_err();

        assert!(matches!(err, SortError::Output(_)));
    }

    const CONTINENTS: [&str; 6] = [
        "North America",
        "Asia",
        "South America",
        "Europe",
        "Africa",
        "Australia",
    ];

    /// Builds a random `id,name,address,continent` record the way the
    /// upstream producer does.
    fn random_record(rng: &mut impl Rng) -> Vec<u8> {
        let letters: Vec<char> = ('a'..='z').chain('A'..='Z').collect();
        let name: String = (0..rng.gen_range(10..16))
            .map(|_| letters[rng.gen_range(0..letters.len())])
            .collect();
        let address: String = (0..rng.gen_range(15..21))
            .map(|_| letters[rng.gen_range(0..letters.len())])
            .collect();
        let continent = CONTINENTS[rng.gen_range(0..CONTINENTS.len())];

        format!("{},{},{},{}", rng.gen_range(-100_000..100_000i64), name, address, continent).into_bytes()
    }

    #[rstest]
    #[case(SortKey::Id)]
    #[case(SortKey::Name)]
    #[case(SortKey::Continent)]
    fn test_random_round_trip(#[case] selector: SortKey) {
        let mut rng = rand::thread_rng();
        let mut input: Vec<Vec<u8>> = (0..1_000).map(|_| random_record(&mut rng)).collect();
        input.shuffle(&mut rng);

        let tmp_dir = tempfile::tempdir().unwrap();
        let sorter = sorter(tmp_dir.path(), (64, 64), 100);

        let mut source = MemorySource::new(input.iter().map(Vec::as_slice));
        let mut sink = MemorySink::default();
        let report = sorter.sort(&mut source, &mut sink, selector).unwrap();

        assert_eq!(report.records, input.len() as u64);
        assert!(report.chunks >= input.len() / 64);

        // non-decreasing under the active comparator
        for pair in sink.records.windows(2) {
            let left = KeyedRecord::new(pair[0].clone(), selector);
            let right = KeyedRecord::new(pair[1].clone(), selector);
            assert_ne!(key::compare(&left, &right), std::cmp::Ordering::Greater);
        }

        // same multiset in and out
        let mut emitted = sink.records.clone();
        emitted.sort();
        input.sort();
        assert_eq!(emitted, input);
    }
}
