//! Sort key selection and extraction.
//!
//! Records are CSV lines of the form `id,name,address,continent` with no
//! embedded commas or newlines. Keys are extracted once at ingest by scanning
//! for comma positions; the record is never parsed again during comparison.

use std::cmp::Ordering;
use std::error::Error;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Record field that drives the sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum SortKey {
    /// Field 0, compared as a signed 64-bit integer.
    Id,
    /// Field 1, compared byte-wise.
    Name,
    /// Field 3, compared byte-wise.
    Continent,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Id => f.write_str("id"),
            SortKey::Name => f.write_str("name"),
            SortKey::Continent => f.write_str("continent"),
        }
    }
}

/// Error returned when a sort key name is not one of `id`, `name`, `continent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSortKeyError {
    key: String,
}

impl fmt::Display for ParseSortKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid sort key {:?}; must be id, name or continent", self.key)
    }
}

impl Error for ParseSortKeyError {}

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortKey::Id),
            "name" => Ok(SortKey::Name),
            "continent" => Ok(SortKey::Continent),
            _ => Err(ParseSortKeyError { key: s.to_owned() }),
        }
    }
}

/// Pre-extracted comparable value.
///
/// `Span` indexes into the bytes of the record it was extracted from, so
/// bytes-kind keys cost no allocation beyond the record copy itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Int(i64),
    Span(Range<usize>),
}

/// A record that owns its payload bytes together with its key.
///
/// The payload is always an engine-owned copy: sources are allowed to recycle
/// their read buffers after the next read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedRecord {
    data: Vec<u8>,
    key: Key,
}

impl KeyedRecord {
    /// Takes ownership of `data` and extracts the key for `selector`.
    pub fn new(data: Vec<u8>, selector: SortKey) -> Self {
        let key = match selector {
            SortKey::Id => Key::Int(parse_id(&data)),
            SortKey::Name => Key::Span(name_span(&data)),
            SortKey::Continent => Key::Span(continent_span(&data)),
        };
        KeyedRecord { data, key }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Byte view of a `Span` key; empty for `Int` keys.
    fn key_bytes(&self) -> &[u8] {
        match &self.key {
            Key::Span(range) => &self.data[range.clone()],
            Key::Int(_) => &[],
        }
    }
}

/// Compares two keyed records extracted under the same selector.
///
/// A phase never mixes key kinds; the cross-kind arms only keep the ordering
/// total.
pub fn compare(a: &KeyedRecord, b: &KeyedRecord) -> Ordering {
    match (&a.key, &b.key) {
        (Key::Int(x), Key::Int(y)) => x.cmp(y),
        (Key::Span(_), Key::Span(_)) => a.key_bytes().cmp(b.key_bytes()),
        (Key::Int(_), Key::Span(_)) => Ordering::Less,
        (Key::Span(_), Key::Int(_)) => Ordering::Greater,
    }
}

/// Parses the leading id field as `i64`: optional leading `-`, then decimal
/// digits up to the first comma. Accumulation stops at any other byte.
/// Upstream ids fit in `i32`; widening to `i64` keeps accumulation safe.
fn parse_id(data: &[u8]) -> i64 {
    let mut n: i64 = 0;
    let mut negative = false;
    for (i, &b) in data.iter().enumerate() {
        match b {
            b',' => break,
            b'-' if i == 0 => negative = true,
            b'0'..=b'9' => n = n * 10 + i64::from(b - b'0'),
            _ => break,
        }
    }
    if negative {
        -n
    } else {
        n
    }
}

/// Range of the name field: between the first and second comma. With a single
/// comma the field runs to the end of the record; with none the whole record
/// is the field.
fn name_span(data: &[u8]) -> Range<usize> {
    let Some(first) = data.iter().position(|&b| b == b',') else {
        return 0..data.len();
    };
    let start = first + 1;
    match data[start..].iter().position(|&b| b == b',') {
        Some(len) => start..start + len,
        None => start..data.len(),
    }
}

/// Range of the continent field: everything after the last comma, or the
/// whole record when there is none.
fn continent_span(data: &[u8]) -> Range<usize> {
    match data.iter().rposition(|&b| b == b',') {
        Some(last) => last + 1..data.len(),
        None => 0..data.len(),
    }
}
