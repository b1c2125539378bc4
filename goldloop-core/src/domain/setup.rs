//! Setup — the discrete fingerprint used for historical pattern matching.

use crate::domain::regime::{Liquidity, Session, Trend, Volatility};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmaCross {
    BullCross,
    BearCross,
    BullAligned,
    BearAligned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    Os,
    Low,
    Neutral,
    High,
    Ob,
}

impl Level {
    /// Bucket a 0-100 oscillator reading into the five discrete levels.
    pub fn from_oscillator(value: f64, oversold: f64, overbought: f64) -> Self {
        if value <= oversold {
            Level::Os
        } else if value <= (oversold + 50.0) / 2.0 {
            Level::Low
        } else if value < (overbought + 50.0) / 2.0 {
            Level::Neutral
        } else if value < overbought {
            Level::High
        } else {
            Level::Ob
        }
    }
}

/// The 6-field discrete fingerprint of a bar, used as the similarity key
/// for historical pattern matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setup {
    pub trend: Trend,
    pub volatility: Volatility,
    pub liquidity: Liquidity,
    pub ema_cross: EmaCross,
    pub stoch_level: Level,
    pub rsi_level: Level,
}

impl Setup {
    /// Hamming similarity over the 6 discrete fields: matches/6.
    pub fn similarity(&self, other: &Setup) -> f64 {
        let matches = [
            self.trend == other.trend,
            self.volatility == other.volatility,
            self.liquidity == other.liquidity,
            self.ema_cross == other.ema_cross,
            self.stoch_level == other.stoch_level,
            self.rsi_level == other.rsi_level,
        ]
        .iter()
        .filter(|&&m| m)
        .count();
        matches as f64 / 6.0
    }

    pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

    pub fn session_bucket(hour: u32) -> Session {
        Session::from_utc_hour(hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::regime::{Liquidity, Trend, Volatility};

    fn base() -> Setup {
        Setup {
            trend: Trend::StrongUptrend,
            volatility: Volatility::NormalVol,
            liquidity: Liquidity::NormalLiq,
            ema_cross: EmaCross::BullAligned,
            stoch_level: Level::Os,
            rsi_level: Level::Low,
        }
    }

    #[test]
    fn identical_setups_have_similarity_one() {
        let a = base();
        assert_eq!(a.similarity(&a), 1.0);
    }

    #[test]
    fn single_field_difference_gives_five_sixths() {
        let a = base();
        let mut b = base();
        b.rsi_level = Level::Neutral;
        assert!((a.similarity(&b) - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn level_bucketing_is_monotone() {
        let low = Level::from_oscillator(5.0, 30.0, 70.0);
        let high = Level::from_oscillator(95.0, 30.0, 70.0);
        assert_eq!(low, Level::Os);
        assert_eq!(high, Level::Ob);
    }
}
