// presenter.rs - Text for result rows

use crate::ledger::{CompressionFailure, CompressionResult, LedgerEntry};

/// How well a file compressed, for colouring its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioClass {
    Good,
    Average,
    Poor,
}

impl RatioClass {
    pub fn of(ratio_percent: f64) -> Self {
        if ratio_percent > 50.0 {
            Self::Good
        } else if ratio_percent > 20.0 {
            Self::Average
        } else {
            Self::Poor
        }
    }
}

/// Human-readable size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2.34 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["Bytes", "KB", "MB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

/// One rendered line of the results list.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Result {
        name: String,
        sizes: String,
        saving: String,
        class: RatioClass,
    },
    Error {
        name: String,
        message: String,
    },
}

impl Row {
    pub fn for_result(result: &CompressionResult) -> Self {
        Self::Result {
            name: result.source_name.clone(),
            sizes: format!(
                "{} → {}",
                format_bytes(result.original_size),
                format_bytes(result.compressed_size)
            ),
            saving: format!("{:.1}% smaller", result.ratio_percent),
            class: RatioClass::of(result.ratio_percent),
        }
    }

    pub fn for_failure(failure: &CompressionFailure) -> Self {
        Self::Error {
            name: failure.source_name.clone(),
            message: failure.reason.clone(),
        }
    }
}

impl From<&LedgerEntry> for Row {
    fn from(entry: &LedgerEntry) -> Self {
        match entry {
            LedgerEntry::Compressed(result) => Self::for_result(result),
            LedgerEntry::Failed(failure) => Self::for_failure(failure),
        }
    }
}

/// Receives one row per processed file, as soon as the file is done.
pub trait Presenter {
    fn push_row(&mut self, index: usize, row: Row);
}

/// Collects rows in memory.
#[derive(Debug, Default)]
pub struct RowLog {
    pub rows: Vec<(usize, Row)>,
}

impl RowLog {
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

impl Presenter for RowLog {
    fn push_row(&mut self, index: usize, row: Row) {
        self.rows.push((index, row));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn bytes_pick_largest_unit() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(512), "512 Bytes");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1024 * 1024), "1 MB");
        assert_eq!(format_bytes(1_000_000), "976.56 KB");
    }

    #[test]
    fn sizes_beyond_megabytes_stay_in_megabytes() {
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3072 MB");
    }

    #[test]
    fn ratio_classes() {
        assert_eq!(RatioClass::of(60.0), RatioClass::Good);
        assert_eq!(RatioClass::of(50.0), RatioClass::Average);
        assert_eq!(RatioClass::of(20.5), RatioClass::Average);
        assert_eq!(RatioClass::of(20.0), RatioClass::Poor);
        assert_eq!(RatioClass::of(-5.0), RatioClass::Poor);
    }

    #[test]
    fn result_row_text() {
        let result = CompressionResult::new("a.jpg", 2048, Bytes::from(vec![0u8; 512]));
        assert_eq!(
            Row::for_result(&result),
            Row::Result {
                name: "a.jpg".into(),
                sizes: "2 KB → 512 Bytes".into(),
                saving: "75.0% smaller".into(),
                class: RatioClass::Good,
            }
        );
    }
}
