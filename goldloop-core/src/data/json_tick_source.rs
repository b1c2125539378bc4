//! File/stdin-backed `TickSource` used by the monitor loop outside of a
//! live network feed.

use std::fs;
use std::path::{Path, PathBuf};

use crate::data::provider::{Tick, TickSource};

/// Reads a single JSON tick document from a file on every poll.
///
/// A missing or unparseable file reads as "no update" rather than an error,
/// matching the monitor loop's permissive posture toward gaps in the feed.
pub struct JsonFileTickSource {
    path: PathBuf,
}

impl JsonFileTickSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TickSource for JsonFileTickSource {
    fn poll(&self) -> Option<Tick> {
        read_tick(&self.path)
    }
}

fn read_tick(path: &Path) -> Option<Tick> {
    let contents = fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_tick_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tick.json");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, r#"{{"price": 2350.5, "score_long": 62.0}}"#).unwrap();
        drop(f);

        let source = JsonFileTickSource::new(&path);
        let tick = source.poll().unwrap();
        assert_eq!(tick.price, Some(2350.5));
        assert_eq!(tick.score_long, Some(62.0));
        assert!(tick.trend.is_none());
    }

    #[test]
    fn missing_file_reads_as_no_update() {
        let source = JsonFileTickSource::new("/nonexistent/path/tick.json");
        assert!(source.poll().is_none());
    }
}
