//! Signal — the scorer's emitted decision.

use crate::domain::regime::Trend;
use crate::domain::sentiment::SentimentLabel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    Long,
    Short,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStrength {
    None,
    Weak,
    Medium,
    Strong,
}

impl SignalStrength {
    /// Strength is monotone in the number of criteria met (of 5).
    pub fn from_criteria_met(criteria_met: f64) -> Self {
        let floored = criteria_met.floor();
        if floored >= 4.0 {
            SignalStrength::Strong
        } else if floored >= 3.0 {
            SignalStrength::Medium
        } else if floored >= 2.0 {
            SignalStrength::Weak
        } else {
            SignalStrength::None
        }
    }
}

/// The scorer's immutable emitted decision. `SignalRecord` (in goldloop-learn)
/// wraps one of these with the full persisted context and mutable outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: chrono::NaiveDateTime,
    pub signal_type: SignalType,
    pub strength: SignalStrength,
    pub entry_price: f64,
    pub regime_label: Trend,
    pub pattern_success_rate: f64,
    pub sentiment_label: SentimentLabel,
    pub criteria_met: f64,
    pub criteria_total: u8,
    pub reasons: Vec<String>,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub rr_ratio: f64,
}
