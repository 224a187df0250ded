// ledger.rs - Per-run record of compressed files and failures

use std::fmt;

use bytes::Bytes;

/// Percentage saved, rounded to one decimal. Zero when `original` is zero.
pub fn ratio_percent(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    let saved = (original as f64 - compressed as f64) / original as f64 * 100.0;
    (saved * 10.0).round() / 10.0
}

#[derive(Clone, PartialEq)]
pub struct CompressionResult {
    pub source_name: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub ratio_percent: f64,
    pub payload: Bytes,
}

impl CompressionResult {
    pub fn new(source_name: impl Into<String>, original_size: u64, payload: Bytes) -> Self {
        let compressed_size = payload.len() as u64;
        Self {
            source_name: source_name.into(),
            original_size,
            compressed_size,
            ratio_percent: ratio_percent(original_size, compressed_size),
            payload,
        }
    }
}

// The payload is elided; it can be megabytes.
impl fmt::Debug for CompressionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionResult")
            .field("source_name", &self.source_name)
            .field("original_size", &self.original_size)
            .field("compressed_size", &self.compressed_size)
            .field("ratio_percent", &self.ratio_percent)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionFailure {
    pub source_name: String,
    pub reason: String,
}

/// Outcome of one file in a run.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEntry {
    Compressed(CompressionResult),
    Failed(CompressionFailure),
}

impl LedgerEntry {
    pub fn source_name(&self) -> &str {
        match self {
            Self::Compressed(result) => &result.source_name,
            Self::Failed(failure) => &failure.source_name,
        }
    }

    pub fn as_result(&self) -> Option<&CompressionResult> {
        match self {
            Self::Compressed(result) => Some(result),
            Self::Failed(_) => None,
        }
    }
}

/// Append-only during a run; cleared when the next run starts.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn push(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn results(&self) -> impl Iterator<Item = &CompressionResult> {
        self.entries.iter().filter_map(LedgerEntry::as_result)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CompressionFailure> {
        self.entries.iter().filter_map(|entry| match entry {
            LedgerEntry::Failed(failure) => Some(failure),
            LedgerEntry::Compressed(_) => None,
        })
    }

    /// Result at entry position `index`, if that entry succeeded.
    pub fn result_at(&self, index: usize) -> Option<&CompressionResult> {
        self.entries.get(index).and_then(LedgerEntry::as_result)
    }

    pub fn has_successes(&self) -> bool {
        self.results().next().is_some()
    }
}
