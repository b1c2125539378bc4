//! Pattern matching domain types.

use crate::domain::setup::Setup;
use serde::{Deserialize, Serialize};

/// A single historical analogue found during a pattern scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternMatch {
    pub setup: Setup,
    pub similarity: f64,
    pub outcome_1b: Option<f64>,
    pub outcome_4b: Option<f64>,
    pub outcome_24b: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternPrediction {
    Bullish,
    Bearish,
    Neutral,
}

/// Aggregated result of scanning history for analogues of the current setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternAnalysis {
    pub prediction: PatternPrediction,
    pub bullish_success_rate: f64,
    pub bearish_success_rate: f64,
    pub avg_outcome_24b: f64,
    pub confidence: f64,
    pub matches_found: usize,
}

impl PatternAnalysis {
    /// Degraded-input default for a scan that finds zero matches of any kind.
    pub fn no_matches_default() -> Self {
        Self {
            prediction: PatternPrediction::Neutral,
            bullish_success_rate: 50.0,
            bearish_success_rate: 50.0,
            avg_outcome_24b: 0.0,
            confidence: 0.0,
            matches_found: 0,
        }
    }
}
