//! Sentiment — cross-market correlation and risk-on/risk-off classification.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentLabel {
    RiskOn,
    RiskOff,
    Neutral,
    Uncertain,
}

/// Correlation of gold returns against one other market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationEntry {
    pub symbol: String,
    pub correlation: f64,
    pub rolling_correlation: f64,
    pub correlation_change: f64,
    pub diverging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentReport {
    pub label: SentimentLabel,
    pub confidence: f64,
    pub correlations: Vec<CorrelationEntry>,
}

impl SentimentReport {
    /// Degraded-input default: an empty correlated basket yields NEUTRAL @ 0.5.
    pub fn neutral_default() -> Self {
        Self { label: SentimentLabel::Neutral, confidence: 0.5, correlations: Vec::new() }
    }

    /// A flat correlation view keyed by symbol.
    pub fn correlation_matrix(&self) -> BTreeMap<String, f64> {
        self.correlations
            .iter()
            .map(|c| (c.symbol.clone(), c.correlation))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_default_has_half_confidence() {
        let s = SentimentReport::neutral_default();
        assert_eq!(s.label, SentimentLabel::Neutral);
        assert_eq!(s.confidence, 0.5);
        assert!(s.correlations.is_empty());
    }

    #[test]
    fn correlation_matrix_is_flat_map() {
        let s = SentimentReport {
            label: SentimentLabel::RiskOn,
            confidence: 0.8,
            correlations: vec![CorrelationEntry {
                symbol: "DXY".into(),
                correlation: -0.4,
                rolling_correlation: -0.5,
                correlation_change: -0.1,
                diverging: false,
            }],
        };
        let m = s.correlation_matrix();
        assert_eq!(m.get("DXY"), Some(&-0.4));
    }
}
