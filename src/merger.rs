//! Binary heap merger.
//!
//! Merges the sorted spill chunks of one run into a single non-decreasing
//! record stream. Worst-case cost is *m* \* log(*k*) comparisons for *m*
//! records across *k* chunks; at most one record per live cursor is resident
//! at any instant.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::io;

use crate::chunk::ScanCursor;
use crate::key::{KeyedRecord, SortKey};

/// One heap entry: the first unconsumed record of a cursor. The origin index
/// tells the merger which cursor to advance after a pop; it also breaks key
/// ties so pop order is deterministic.
struct MergeItem<F> {
    record: KeyedRecord,
    origin: usize,
    compare: F,
}

impl<F> PartialEq for MergeItem<F>
where
    F: Fn(&KeyedRecord, &KeyedRecord) -> Ordering,
{
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<F> Eq for MergeItem<F> where F: Fn(&KeyedRecord, &KeyedRecord) -> Ordering {}

impl<F> PartialOrd for MergeItem<F>
where
    F: Fn(&KeyedRecord, &KeyedRecord) -> Ordering,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<F> Ord for MergeItem<F>
where
    F: Fn(&KeyedRecord, &KeyedRecord) -> Ordering,
{
    fn cmp(&self, other: &Self) -> Ordering {
        (self.compare)(&self.record, &other.record).then_with(|| self.origin.cmp(&other.origin))
    }
}

/// Streaming k-way merge over sorted scan cursors.
/// Cursors must yield records in non-decreasing order under `compare`,
/// otherwise the output order is undefined.
pub struct BinaryHeapMerger<F> {
    // binary heap is a max-heap by default so entries are reversed to get a min-heap
    items: BinaryHeap<Reverse<MergeItem<F>>>,
    cursors: Vec<Option<ScanCursor>>,
    selector: SortKey,
    compare: F,
    initiated: bool,
}

impl<F> BinaryHeapMerger<F>
where
    F: Fn(&KeyedRecord, &KeyedRecord) -> Ordering + Copy,
{
    pub fn new(cursors: Vec<ScanCursor>, selector: SortKey, compare: F) -> Self {
        let cursors = Vec::from_iter(cursors.into_iter().map(Some));
        let items = BinaryHeap::with_capacity(cursors.len());

        BinaryHeapMerger {
            items,
            cursors,
            selector,
            compare,
            initiated: false,
        }
    }

    /// Pulls the next record from a cursor into the heap; a drained cursor is
    /// closed and contributes nothing further.
    fn advance(&mut self, origin: usize) -> io::Result<()> {
        let Some(cursor) = self.cursors[origin].as_mut() else {
            return Ok(());
        };
        match cursor.next() {
            Some(Ok(data)) => {
                self.items.push(Reverse(MergeItem {
                    record: KeyedRecord::new(data, self.selector),
                    origin,
                    compare: self.compare,
                }));
            }
            Some(Err(err)) => return Err(err),
            None => self.cursors[origin] = None,
        }
        Ok(())
    }
}

impl<F> Iterator for BinaryHeapMerger<F>
where
    F: Fn(&KeyedRecord, &KeyedRecord) -> Ordering + Copy,
{
    type Item = io::Result<Vec<u8>>;

    /// Returns the next record in ascending key order. A cursor read failure
    /// is yielded in place; callers treat it as fatal to the merge.
    fn next(&mut self) -> Option<Self::Item> {
        if !self.initiated {
            self.initiated = true;
            for origin in 0..self.cursors.len() {
                if let Err(err) = self.advance(origin) {
                    return Some(Err(err));
                }
            }
        }

        let Reverse(item) = self.items.pop()?;
        if let Err(err) = self.advance(item.origin) {
            return Some(Err(err));
        }

        Some(Ok(item.record.into_data()))
    }
}
