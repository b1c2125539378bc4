//! `DiscoveredPattern` — a condition-set hypothesis scored by historical
//! win-rate, profit-factor, and sample size.

use crate::domain::trading_rule::Condition;
use crate::domain::Direction;
use goldloop_core::domain::{Session, Trend};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternFamily {
    SingleIndicator,
    Combo,
    RegimeSpecific,
    SessionSpecific,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredPattern {
    pub family: PatternFamily,
    pub conditions: BTreeMap<String, Condition>,
    pub direction: Direction,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub sample_size: usize,
    pub best_regime: Option<Trend>,
    pub best_session: Option<Session>,
    pub confidence: f64,
}

impl DiscoveredPattern {
    /// Gate: `sample_size >= 30 && win_rate >= 55 && profit_factor >= 1.3`.
    pub fn passes_gates(sample_size: usize, win_rate: f64, profit_factor: f64) -> bool {
        sample_size >= 30 && win_rate >= 55.0 && profit_factor >= 1.3
    }

    /// `(win_rate - 50)*2 + (profit_factor - 1)*20 + min(sample/10, 30)`,
    /// clamped to `[0,100]`; combo patterns get a +10 bonus.
    pub fn confidence_for(win_rate: f64, profit_factor: f64, sample_size: usize, family: PatternFamily) -> f64 {
        let mut confidence = (win_rate - 50.0) * 2.0 + (profit_factor - 1.0) * 20.0 + (sample_size as f64 / 10.0).min(30.0);
        if family == PatternFamily::Combo {
            confidence += 10.0;
        }
        confidence.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gates_reject_small_samples() {
        assert!(!DiscoveredPattern::passes_gates(20, 60.0, 1.5));
        assert!(DiscoveredPattern::passes_gates(30, 55.0, 1.3));
    }

    #[test]
    fn combo_gets_confidence_bonus() {
        let single = DiscoveredPattern::confidence_for(60.0, 1.5, 40, PatternFamily::SingleIndicator);
        let combo = DiscoveredPattern::confidence_for(60.0, 1.5, 40, PatternFamily::Combo);
        assert!((combo - single - 10.0).abs() < 1e-9);
    }

    #[test]
    fn confidence_is_clamped() {
        let confidence = DiscoveredPattern::confidence_for(100.0, 5.0, 1000, PatternFamily::Combo);
        assert_eq!(confidence, 100.0);
    }
}
