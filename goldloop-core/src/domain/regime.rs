//! Regime labels — discrete market-state classification.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    StrongUptrend,
    WeakUptrend,
    Ranging,
    WeakDowntrend,
    StrongDowntrend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Volatility {
    LowVol,
    NormalVol,
    HighVol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Liquidity {
    LowLiq,
    NormalLiq,
    HighLiq,
}

/// Discrete label for the bar's hour, in UTC: asia, london, newyork, overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Session {
    Asia,
    London,
    Newyork,
    Overlap,
}

impl Session {
    /// Classify a UTC hour (0-23) into one of the four sessions.
    pub fn from_utc_hour(hour: u32) -> Self {
        match hour {
            0..=6 => Session::Asia,
            7..=12 => Session::London,
            13..=16 => Session::Overlap,
            _ => Session::Newyork,
        }
    }
}

/// Per-bar regime classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Regime {
    pub trend: Trend,
    pub volatility: Volatility,
    pub liquidity: Liquidity,
    pub adx: f64,
    pub ema_slope_pct: f64,
    pub atr_ratio: f64,
    pub vol_ratio: f64,
    pub price: f64,
    pub ema_9: f64,
    pub ema_21: f64,
    pub ema_50: f64,
}

/// Aggregate distribution over a regime history, plus the most recent label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeSummary {
    pub trend_pct: Vec<(Trend, f64)>,
    pub volatility_pct: Vec<(Volatility, f64)>,
    pub liquidity_pct: Vec<(Liquidity, f64)>,
    pub most_recent: Option<Regime>,
}
