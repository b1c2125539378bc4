//! `SignalRecord` — a persisted `Signal` with full entry context and a
//! mutable outcome that accrues price snapshots over time.

use goldloop_core::domain::{CorrelationEntry, Signal, TuningConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStatus {
    Pending,
    Tracking,
    Completed,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeResult {
    Win,
    Loss,
    Breakeven,
    Pending,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub minutes_elapsed: i64,
    pub price: f64,
    pub pnl_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub snapshots: Vec<PriceSnapshot>,
    pub max_profit: f64,
    pub max_drawdown: f64,
    pub target_hit: bool,
    pub target_time: Option<i64>,
    pub stop_hit: bool,
    pub stop_time: Option<i64>,
    pub final_pnl: Option<f64>,
    pub result: TradeResult,
}

impl Default for Outcome {
    fn default() -> Self {
        Self {
            snapshots: Vec::new(),
            max_profit: 0.0,
            max_drawdown: 0.0,
            target_hit: false,
            target_time: None,
            stop_hit: false,
            stop_time: None,
            final_pnl: None,
            result: TradeResult::Pending,
        }
    }
}

/// Persisted signal plus entry-time snapshots and a mutable outcome.
/// `id` follows a `sig_{utc timestamp}_{6 hex chars}` scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRecord {
    pub id: String,
    pub signal: Signal,
    pub indicators_at_entry: BTreeMap<String, f64>,
    pub correlations_at_entry: Vec<CorrelationEntry>,
    pub config_used: TuningConfig,
    pub status: SignalStatus,
    pub outcome: Outcome,
}

impl SignalRecord {
    pub fn new(
        id: String,
        signal: Signal,
        indicators_at_entry: BTreeMap<String, f64>,
        correlations_at_entry: Vec<CorrelationEntry>,
        config_used: TuningConfig,
    ) -> Self {
        Self {
            id,
            signal,
            indicators_at_entry,
            correlations_at_entry,
            config_used,
            status: SignalStatus::Pending,
            outcome: Outcome::default(),
        }
    }

    fn pnl_pct(&self, price: f64) -> f64 {
        use goldloop_core::domain::SignalType;
        if self.signal.entry_price == 0.0 {
            return 0.0;
        }
        let raw = match self.signal.signal_type {
            SignalType::Short => self.signal.entry_price - price,
            _ => price - self.signal.entry_price,
        };
        raw / self.signal.entry_price * 100.0
    }
}
