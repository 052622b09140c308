//! Budget-bounded chunk accumulation.

use sysinfo::System;

/// Lower bound on the adaptive record budget. Fewer spill files keep the
/// merge heap small.
pub const DEFAULT_CHUNK_FLOOR: usize = 500_000;
/// Upper bound on the adaptive record budget. Caps the resident footprint of
/// a single chunk.
pub const DEFAULT_CHUNK_CEILING: usize = 2_000_000;

/// Estimated resident footprint of one keyed record: ~53 payload bytes plus
/// per-record allocation and key overhead.
const RECORD_FOOTPRINT_BYTES: u64 = 73;
/// Share of available memory handed to a chunk; the remainder is headroom
/// for the merge heap and I/O buffers.
const BUDGET_PERCENT: u64 = 60;

/// Picks a per-chunk record budget from an OS-level view of available
/// memory, clamped to `[floor, ceiling]`.
///
/// On hosts where the probe reports nothing useful the clamp pins the result
/// to `floor`, which is the governing bound in practice.
pub fn adaptive_budget(floor: usize, ceiling: usize) -> usize {
    let mut system = System::new();
    system.refresh_memory();

    let usable = system.available_memory() / 100 * BUDGET_PERCENT;
    let budget = usize::try_from(usable / RECORD_FOOTPRINT_BYTES).unwrap_or(usize::MAX);

    log::debug!(
        "memory probe: {} MiB available, raw budget {} records",
        system.available_memory() >> 20,
        budget,
    );
    budget.clamp(floor, ceiling)
}

/// In-memory accumulator for one chunk, limited by record count.
pub struct RecordBuffer<T> {
    limit: usize,
    records: Vec<T>,
}

impl<T> RecordBuffer<T> {
    /// Creates a buffer that accepts up to `limit` records, preallocating
    /// every slot.
    pub fn new(limit: usize) -> Self {
        RecordBuffer {
            limit,
            records: Vec::with_capacity(limit),
        }
    }

    pub fn push(&mut self, record: T) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.limit
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.records.as_mut_slice()
    }
}

impl<T> IntoIterator for RecordBuffer<T> {
    type Item = T;
    type IntoIter = <Vec<T> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
