//! Multi-config tester — runs N `AutoLogger` configurations over the same
//! tick history in parallel, each against its own private store and its
//! own in-memory trade set. No shared mutable state between runs: results
//! are aggregated only after every run's store has been written.

use rayon::prelude::*;

use goldloop_core::data::Tick;

use crate::auto_logger::{AutoLogger, AutoLoggerConfig, LoggerStats};
use crate::auto_logger_store::AutoLoggerStore;
use crate::error::Result;

/// One configuration under test, paired with the SQLite path its run
/// persists to. Distinct paths keep runs from contending on the same file.
pub struct CandidateConfig {
    pub label: String,
    pub config: AutoLoggerConfig,
    pub store_path: String,
}

#[derive(Debug, Clone)]
pub struct CandidateResult {
    pub label: String,
    pub stats: LoggerStats,
}

/// Drive one candidate through the full tick history, persisting every
/// open/closed trade to its own store as `AutoLogger::on_tick` would in
/// the live poll loop. Returns the candidate's closed-trade statistics.
fn run_one(candidate: &CandidateConfig, ticks: &[(chrono::NaiveDateTime, Tick)]) -> Result<CandidateResult> {
    let store = AutoLoggerStore::open(&candidate.store_path)?;
    let mut logger = AutoLogger::new(candidate.config.clone());

    for (now, tick) in ticks {
        logger.on_tick(tick, *now)?;
        for trade in logger.open_trades() {
            store.upsert_trade(trade)?;
        }
        for trade in logger.closed_trades() {
            store.upsert_trade(trade)?;
        }
    }

    Ok(CandidateResult { label: candidate.label.clone(), stats: logger.stats() })
}

/// Run every candidate against the same `ticks` sequence concurrently.
/// A candidate whose run fails is dropped from the result set rather than
/// aborting the whole sweep; the failure itself is not surfaced here since
/// stores are independent and unaffected by a sibling's failure.
pub fn run_sweep(candidates: &[CandidateConfig], ticks: &[(chrono::NaiveDateTime, Tick)]) -> Vec<CandidateResult> {
    candidates.par_iter().filter_map(|candidate| run_one(candidate, ticks).ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn tick(price: f64, long: f64, short: f64) -> Tick {
        Tick { price: Some(price), score_long: Some(long), score_short: Some(short), ..Default::default() }
    }

    #[test]
    fn independent_candidates_each_get_their_own_stats() {
        let dir = tempfile::tempdir().unwrap();
        let ticks = vec![
            (ts(0), tick(2000.0, 65.0, 10.0)),
            (ts(1), tick(2020.0, 10.0, 10.0)), // default TP=2015 -> win for a loose candidate
        ];

        let loose = CandidateConfig {
            label: "loose".to_string(),
            config: AutoLoggerConfig { min_score: 50.0, ..AutoLoggerConfig::default() },
            store_path: dir.path().join("loose.db").to_string_lossy().to_string(),
        };
        let strict = CandidateConfig {
            label: "strict".to_string(),
            config: AutoLoggerConfig { min_score: 90.0, ..AutoLoggerConfig::default() },
            store_path: dir.path().join("strict.db").to_string_lossy().to_string(),
        };

        let results = run_sweep(&[loose, strict], &ticks);
        assert_eq!(results.len(), 2);

        let loose_result = results.iter().find(|r| r.label == "loose").unwrap();
        let strict_result = results.iter().find(|r| r.label == "strict").unwrap();
        assert_eq!(loose_result.stats.total, 1);
        assert_eq!(strict_result.stats.total, 0);
    }

    #[test]
    fn candidates_persist_to_distinct_stores() {
        let dir = tempfile::tempdir().unwrap();
        let ticks = vec![(ts(0), tick(2000.0, 65.0, 10.0))];
        let a = CandidateConfig {
            label: "a".to_string(),
            config: AutoLoggerConfig::default(),
            store_path: dir.path().join("a.db").to_string_lossy().to_string(),
        };
        let b = CandidateConfig {
            label: "b".to_string(),
            config: AutoLoggerConfig::default(),
            store_path: dir.path().join("b.db").to_string_lossy().to_string(),
        };
        run_sweep(&[a, b], &ticks);
        assert!(dir.path().join("a.db").exists());
        assert!(dir.path().join("b.db").exists());
    }
}
