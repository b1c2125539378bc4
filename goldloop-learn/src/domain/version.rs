//! `StrategyVersion` — a frozen snapshot of (top rules, tuning config,
//! timestamp) with an active/inactive flag, plus the production export
//! artifact derived from the currently active version.

use crate::domain::TradingRule;
use goldloop_core::domain::TuningConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyVersion {
    pub version_id: String,
    pub created_at: chrono::NaiveDateTime,
    pub rules_count: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub is_active: bool,
    pub notes: String,
    /// The `u64` seed that drove this iteration's Rule Evolver run, so a
    /// failed or re-run learning cycle is exactly reproducible.
    pub rng_seed: u64,
}

/// Single exported production-config artifact: active rules + tuning
/// config + version id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionConfig {
    pub version_id: String,
    pub rules: Vec<TradingRule>,
    pub tuning_config: TuningConfig,
}

/// Scalar-only projection of `TuningConfig` for the downstream sync
/// target that has no concept of the regime/session override maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    pub stoch_oversold: f64,
    pub stoch_overbought: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub min_score_long: f64,
    pub min_score_short: f64,
    pub atr_stop_mult: f64,
    pub atr_tp_mult: f64,
    pub adx_min_trend: f64,
}

impl From<&TuningConfig> for FirebaseConfig {
    fn from(config: &TuningConfig) -> Self {
        Self {
            stoch_oversold: config.stoch_oversold,
            stoch_overbought: config.stoch_overbought,
            rsi_oversold: config.rsi_oversold,
            rsi_overbought: config.rsi_overbought,
            min_score_long: config.min_score_long,
            min_score_short: config.min_score_short,
            atr_stop_mult: config.atr_stop_mult,
            atr_tp_mult: config.atr_tp_mult,
            adx_min_trend: config.adx_min_trend,
        }
    }
}

/// The full version history plus which one is active, as written to the
/// strategy-versions artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyVersionsDocument {
    pub versions: Vec<StrategyVersion>,
    pub current_id: Option<String>,
}
