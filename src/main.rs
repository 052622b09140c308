use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use bytesize::ByteSize;
use clap::Parser;

use topic_sort::{ExternalSorterBuilder, ReaderSource, SortKey, WriterSink};

#[derive(Parser)]
#[command(name = "topic-sort", version, about = "streaming external merge sorter")]
struct Args {
    /// File of newline-delimited records to be sorted
    #[arg(short, long)]
    input: PathBuf,

    /// Result file
    #[arg(short, long)]
    output: PathBuf,

    /// Record field driving the sort order
    #[arg(short = 'k', long = "sort-key", value_enum)]
    sort_key: SortKey,

    /// Parent directory for spill files (OS temp dir when omitted)
    #[arg(short = 'd', long)]
    tmp_dir: Option<PathBuf>,

    /// Lower bound on the adaptive per-chunk record budget
    #[arg(long, default_value_t = topic_sort::DEFAULT_CHUNK_FLOOR)]
    chunk_floor: usize,

    /// Upper bound on the adaptive per-chunk record budget
    #[arg(long, default_value_t = topic_sort::DEFAULT_CHUNK_CEILING)]
    chunk_ceiling: usize,

    /// Per-chunk input drain deadline, in seconds
    #[arg(long, default_value_t = 5)]
    read_timeout: u64,

    /// Records per publish batch
    #[arg(long, default_value_t = topic_sort::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Spill file read/write buffer size
    #[arg(long, default_value = "4MiB")]
    io_buffer: ByteSize,

    /// Number of threads to use for parallel chunk sorting
    #[arg(short, long)]
    threads: Option<usize>,

    /// Logging level
    #[arg(short, long, default_value = "info")]
    log_level: log::LevelFilter,
}

fn main() {
    let args = Args::parse();
    init_logger(args.log_level);

    let input_stream = match fs::File::open(&args.input) {
        Ok(file) => io::BufReader::new(file),
        Err(err) => {
            log::error!("input file opening error: {}", err);
            process::exit(1);
        }
    };

    let output_stream = match fs::File::create(&args.output) {
        Ok(file) => io::BufWriter::new(file),
        Err(err) => {
            log::error!("output file creation error: {}", err);
            process::exit(1);
        }
    };

    let mut sorter_builder = ExternalSorterBuilder::new()
        .with_chunk_bounds(args.chunk_floor, args.chunk_ceiling)
        .with_read_timeout(Duration::from_secs(args.read_timeout))
        .with_batch_size(args.batch_size)
        .with_io_buffer_size(args.io_buffer.as_u64() as usize);

    if let Some(threads) = args.threads {
        sorter_builder = sorter_builder.with_threads_number(threads);
    }

    if let Some(tmp_dir) = &args.tmp_dir {
        sorter_builder = sorter_builder.with_tmp_dir(tmp_dir);
    }

    let sorter = match sorter_builder.build() {
        Ok(sorter) => sorter,
        Err(err) => {
            log::error!("sorter initialization error: {}", err);
            process::exit(1);
        }
    };

    let mut source = ReaderSource::new(input_stream);
    let mut sink = WriterSink::new(output_stream);

    match sorter.sort(&mut source, &mut sink, args.sort_key) {
        Ok(report) => log::info!(
            "sorted {} records by {} in {} chunks (chunk phase {:?}, merge phase {:?})",
            report.records,
            args.sort_key,
            report.chunks,
            report.chunk_elapsed,
            report.merge_elapsed,
        ),
        Err(err) => {
            log::error!("sorting error: {}", err);
            process::exit(1);
        }
    }
}

fn init_logger(log_level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();
}
