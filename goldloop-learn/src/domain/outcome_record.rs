//! `OutcomeRecord` — the labeled history row the Pattern Miner, Rule
//! Evolver, Auto-Tuner, and Performance Analyzer all consume.
//!
//! Concatenation and dedup policy across multiple outcome histories is
//! left to the caller: every component here takes a plain
//! `&[OutcomeRecord]` slice and never reaches into a store on its own.

use goldloop_core::domain::{Session, Trend};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WinLoss {
    Win,
    Loss,
}

/// One closed trade's labeled context, as consumed by the learning
/// subsystem. `rule_ids` records which (if any) evolved rules voted for
/// this trade, feeding the Performance Analyzer's rule-level breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub timestamp: chrono::NaiveDateTime,
    pub price: f64,
    pub rsi: f64,
    pub stoch_k: f64,
    pub adx: f64,
    pub atr_percentile: f64,
    pub regime: Trend,
    pub session: Session,
    pub direction: Direction,
    pub outcome: WinLoss,
    pub pnl: f64,
    pub hold_minutes: i64,
    pub score: f64,
    pub rule_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let r = OutcomeRecord {
            timestamp: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(10, 0, 0).unwrap(),
            price: 2000.0,
            rsi: 45.0,
            stoch_k: 30.0,
            adx: 28.0,
            atr_percentile: 50.0,
            regime: Trend::StrongUptrend,
            session: Session::London,
            direction: Direction::Long,
            outcome: WinLoss::Win,
            pnl: 12.5,
            hold_minutes: 90,
            score: 72.0,
            rule_ids: vec!["rule_1".into()],
        };
        let json = serde_json::to_string(&r).unwrap();
        let back: OutcomeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pnl, 12.5);
        assert_eq!(back.outcome, WinLoss::Win);
    }
}
