//! TuningConfig — the live scorer's adjustable scalar parameters.

use crate::domain::regime::{Session, Trend};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat scalar thresholds driving regime gating and the signal scorer,
/// plus optional per-regime/per-session overrides applied on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningConfig {
    pub stoch_oversold: f64,
    pub stoch_overbought: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub min_score_long: f64,
    pub min_score_short: f64,
    pub atr_stop_mult: f64,
    pub atr_tp_mult: f64,
    pub adx_min_trend: f64,
    #[serde(default)]
    pub regime_adjustments: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub session_adjustments: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            stoch_oversold: 20.0,
            stoch_overbought: 80.0,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            min_score_long: 60.0,
            min_score_short: 60.0,
            atr_stop_mult: 2.0,
            atr_tp_mult: 3.0,
            adx_min_trend: 25.0,
            regime_adjustments: BTreeMap::new(),
            session_adjustments: BTreeMap::new(),
        }
    }
}

impl TuningConfig {
    /// Overlay a named scalar, accounting for any regime-specific override.
    pub fn effective_param(&self, param: &str, regime: Option<Trend>) -> f64 {
        if let Some(r) = regime {
            let key = format!("{r:?}");
            if let Some(overrides) = self.regime_adjustments.get(&key) {
                if let Some(v) = overrides.get(param) {
                    return *v;
                }
            }
        }
        self.base_param(param)
    }

    pub fn effective_param_for_session(&self, param: &str, session: Session) -> f64 {
        let key = format!("{session:?}");
        if let Some(overrides) = self.session_adjustments.get(&key) {
            if let Some(v) = overrides.get(param) {
                return *v;
            }
        }
        self.base_param(param)
    }

    fn base_param(&self, param: &str) -> f64 {
        match param {
            "stoch_oversold" => self.stoch_oversold,
            "stoch_overbought" => self.stoch_overbought,
            "rsi_oversold" => self.rsi_oversold,
            "rsi_overbought" => self.rsi_overbought,
            "min_score_long" => self.min_score_long,
            "min_score_short" => self.min_score_short,
            "atr_stop_mult" => self.atr_stop_mult,
            "atr_tp_mult" => self.atr_tp_mult,
            "adx_min_trend" => self.adx_min_trend,
            _ => f64::NAN,
        }
    }

    /// Export scalars-only for the Firebase/production artifact (no maps).
    pub fn scalars_only_json(&self) -> serde_json::Value {
        serde_json::json!({
            "stoch_oversold": self.stoch_oversold,
            "stoch_overbought": self.stoch_overbought,
            "rsi_oversold": self.rsi_oversold,
            "rsi_overbought": self.rsi_overbought,
            "min_score_long": self.min_score_long,
            "min_score_short": self.min_score_short,
            "atr_stop_mult": self.atr_stop_mult,
            "atr_tp_mult": self.atr_tp_mult,
            "adx_min_trend": self.adx_min_trend,
        })
    }
}
