//! Signal Log — the append-only store of `SignalRecord`s.
//!
//! `log` is the only way to create a record; `update_outcome`/`complete`
//! are the only mutation paths thereafter, both looked up by id. Records
//! loaded from disk at startup are treated as already-materialized history
//! and are not re-validated against the invariants below — they were
//! validated when first written.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rand::Rng;

use goldloop_core::domain::{CorrelationEntry, Signal, SignalType, TuningConfig};

use crate::domain::{Outcome, PriceSnapshot, SignalRecord, SignalStatus, TradeResult};
use crate::error::{LearnError, Result};

#[derive(Debug, Default)]
pub struct SignalLog {
    records: BTreeMap<String, SignalRecord>,
    /// Insertion order, preserved for the persisted document's `signals[]`.
    order: Vec<String>,
}

impl SignalLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from records already materialized on disk — skips
    /// invariant validation.
    pub fn from_records(records: Vec<SignalRecord>) -> Self {
        let mut log = Self::new();
        for record in records {
            log.order.push(record.id.clone());
            log.records.insert(record.id.clone(), record);
        }
        log
    }

    /// Assign a `sig_{utc timestamp}_{6 hex chars}` id and append a new
    /// pending record.
    pub fn log(
        &mut self,
        signal: Signal,
        indicators_at_entry: BTreeMap<String, f64>,
        correlations_at_entry: Vec<CorrelationEntry>,
        config_used: TuningConfig,
        rng: &mut impl Rng,
    ) -> String {
        let suffix: String = (0..6).map(|_| format!("{:x}", rng.gen_range(0..16))).collect();
        let id = format!("sig_{}_{suffix}", signal.timestamp.and_utc().timestamp());
        let record = SignalRecord::new(id.clone(), signal, indicators_at_entry, correlations_at_entry, config_used);
        self.order.push(id.clone());
        self.records.insert(id.clone(), record);
        id
    }

    pub fn get(&self, id: &str) -> Option<&SignalRecord> {
        self.records.get(id)
    }

    pub fn records_in_order(&self) -> impl Iterator<Item = &SignalRecord> {
        self.order.iter().filter_map(move |id| self.records.get(id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a price snapshot at `minutes_elapsed`, which must be strictly
    /// non-decreasing per id — a regression is a class-3 invariant
    /// violation, rejected with no mutation.
    pub fn update_outcome(&mut self, id: &str, price: f64, minutes_elapsed: i64) -> Result<()> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| LearnError::InvariantViolation(format!("unknown signal id: {id}")))?;

        if let Some(last) = record.outcome.snapshots.last() {
            if minutes_elapsed < last.minutes_elapsed {
                return Err(LearnError::InvariantViolation(format!(
                    "non-monotone outcome update for {id}: {minutes_elapsed} < {}",
                    last.minutes_elapsed
                )));
            }
        }

        let pnl_pct = pnl_pct(&record.signal, price);
        record.outcome.snapshots.push(PriceSnapshot { minutes_elapsed, price, pnl_pct });
        if pnl_pct > record.outcome.max_profit {
            record.outcome.max_profit = pnl_pct;
        }
        if pnl_pct < record.outcome.max_drawdown {
            record.outcome.max_drawdown = pnl_pct;
        }

        let target_hit = crossed_target(&record.signal, price);
        let stop_hit = crossed_stop(&record.signal, price);
        // Idempotent: a later tick re-crossing the target does not
        // overwrite `target_time`.
        if target_hit && !record.outcome.target_hit {
            record.outcome.target_hit = true;
            record.outcome.target_time = Some(minutes_elapsed);
        }
        if stop_hit && !record.outcome.stop_hit {
            record.outcome.stop_hit = true;
            record.outcome.stop_time = Some(minutes_elapsed);
        }
        record.status = SignalStatus::Tracking;
        Ok(())
    }

    /// Finalize the outcome: target_hit -> WIN; stop_hit -> LOSS; else by
    /// sign of final PnL (0 -> BREAKEVEN).
    pub fn complete(&mut self, id: &str, final_price: f64) -> Result<()> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| LearnError::InvariantViolation(format!("unknown signal id: {id}")))?;

        let final_pnl = pnl_pct(&record.signal, final_price);
        record.outcome.final_pnl = Some(final_pnl);
        record.outcome.result = if record.outcome.target_hit {
            TradeResult::Win
        } else if record.outcome.stop_hit {
            TradeResult::Loss
        } else if final_pnl > 0.0 {
            TradeResult::Win
        } else if final_pnl < 0.0 {
            TradeResult::Loss
        } else {
            TradeResult::Breakeven
        };
        record.status = SignalStatus::Completed;
        Ok(())
    }
}

fn pnl_pct(signal: &Signal, price: f64) -> f64 {
    if signal.entry_price == 0.0 {
        return 0.0;
    }
    let raw = match signal.signal_type {
        SignalType::Short => signal.entry_price - price,
        _ => price - signal.entry_price,
    };
    raw / signal.entry_price * 100.0
}

fn crossed_target(signal: &Signal, price: f64) -> bool {
    match signal.signal_type {
        SignalType::Long => price >= signal.take_profit,
        SignalType::Short => price <= signal.take_profit,
        SignalType::None => false,
    }
}

fn crossed_stop(signal: &Signal, price: f64) -> bool {
    match signal.signal_type {
        SignalType::Long => price <= signal.stop_loss,
        SignalType::Short => price >= signal.stop_loss,
        SignalType::None => false,
    }
}

/// On-disk document shape: `{ signals: [...], metadata: { last_updated,
/// total, schema_version } }`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct SignalLogDocument {
    pub signals: Vec<SignalRecord>,
    pub metadata: SignalLogMetadata,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct SignalLogMetadata {
    pub last_updated: NaiveDateTime,
    pub total: usize,
    pub schema_version: String,
}

impl SignalLog {
    pub fn to_document(&self, now: NaiveDateTime) -> SignalLogDocument {
        let signals: Vec<SignalRecord> = self.records_in_order().cloned().collect();
        let total = signals.len();
        SignalLogDocument { signals, metadata: SignalLogMetadata { last_updated: now, total, schema_version: "1.0".to_string() } }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goldloop_core::domain::{SentimentLabel, SignalStrength, Trend};
    use rand::SeedableRng;

    fn sample_signal(signal_type: SignalType) -> Signal {
        Signal {
            timestamp: chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            signal_type,
            strength: SignalStrength::Strong,
            entry_price: 2000.0,
            regime_label: Trend::StrongUptrend,
            pattern_success_rate: 70.0,
            sentiment_label: SentimentLabel::RiskOn,
            criteria_met: 5.0,
            criteria_total: 5,
            reasons: vec!["trend is strong".into()],
            stop_loss: 1980.0,
            take_profit: 2030.0,
            rr_ratio: 1.5,
        }
    }

    #[test]
    fn log_assigns_sig_prefixed_id() {
        let mut log = SignalLog::new();
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let id = log.log(sample_signal(SignalType::Long), BTreeMap::new(), Vec::new(), TuningConfig::default(), &mut rng);
        assert!(id.starts_with("sig_"));
        assert_eq!(log.get(&id).unwrap().status, SignalStatus::Pending);
    }

    #[test]
    fn non_monotone_update_is_rejected() {
        let mut log = SignalLog::new();
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let id = log.log(sample_signal(SignalType::Long), BTreeMap::new(), Vec::new(), TuningConfig::default(), &mut rng);
        log.update_outcome(&id, 2010.0, 30).unwrap();
        let err = log.update_outcome(&id, 2005.0, 10);
        assert!(err.is_err());
    }

    #[test]
    fn target_hit_takes_priority_over_final_sign_at_complete() {
        let mut log = SignalLog::new();
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let id = log.log(sample_signal(SignalType::Long), BTreeMap::new(), Vec::new(), TuningConfig::default(), &mut rng);
        log.update_outcome(&id, 2035.0, 10).unwrap();
        assert!(log.get(&id).unwrap().outcome.target_hit);
        // Price later falls back under entry, but target was already hit.
        log.complete(&id, 1999.0).unwrap();
        assert_eq!(log.get(&id).unwrap().outcome.result, TradeResult::Win);
        assert_eq!(log.get(&id).unwrap().status, SignalStatus::Completed);
    }

    #[test]
    fn target_time_is_not_overwritten_on_later_recross() {
        let mut log = SignalLog::new();
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let id = log.log(sample_signal(SignalType::Long), BTreeMap::new(), Vec::new(), TuningConfig::default(), &mut rng);
        log.update_outcome(&id, 2035.0, 10).unwrap();
        log.update_outcome(&id, 2040.0, 20).unwrap();
        assert_eq!(log.get(&id).unwrap().outcome.target_time, Some(10));
    }

    #[test]
    fn breakeven_on_zero_final_pnl_with_no_levels_hit() {
        let mut log = SignalLog::new();
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let id = log.log(sample_signal(SignalType::Long), BTreeMap::new(), Vec::new(), TuningConfig::default(), &mut rng);
        log.update_outcome(&id, 2000.0, 10).unwrap();
        log.complete(&id, 2000.0).unwrap();
        assert_eq!(log.get(&id).unwrap().outcome.result, TradeResult::Breakeven);
    }
}
