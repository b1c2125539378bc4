//! File-backed `BarSource` used by tests and the CLI's offline mode.
//!
//! Reads one CSV file per symbol from a directory, columns:
//! `date,open,high,low,close,volume`. A missing file (unknown symbol) or
//! unparseable row yields an empty result for that symbol rather than an error.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::data::provider::{BarSource, RawBar};

pub struct CsvBarSource {
    dir: PathBuf,
}

impl CsvBarSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl BarSource for CsvBarSource {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<RawBar> {
        let path = self.path_for(symbol);
        read_bars_in_range(&path, start, end).unwrap_or_default()
    }
}

fn read_bars_in_range(path: &Path, start: NaiveDate, end: NaiveDate) -> csv::Result<Vec<RawBar>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut bars = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Some(bar) = parse_record(&record) else { continue };
        if bar.timestamp >= start && bar.timestamp <= end {
            bars.push(bar);
        }
    }
    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

fn parse_record(record: &csv::StringRecord) -> Option<RawBar> {
    Some(RawBar {
        timestamp: record.get(0)?.parse().ok()?,
        open: record.get(1)?.parse().ok()?,
        high: record.get(2)?.parse().ok()?,
        low: record.get(3)?.parse().ok()?,
        close: record.get(4)?.parse().ok()?,
        volume: record.get(5)?.parse().ok()?,
    })
}
