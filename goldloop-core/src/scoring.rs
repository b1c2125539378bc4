//! Signal Scorer — combine regime, pattern statistics, sentiment, and
//! indicator state into a weighted long/short decision with risk parameters.

use crate::components::IndicatorValues;
use crate::domain::{
    EmaCross, PatternAnalysis, Regime, SentimentLabel, SentimentReport, Signal, SignalStrength,
    SignalType, Trend, TuningConfig,
};

const CRITERIA_TOTAL: u8 = 5;

struct DirectionScore {
    score: f64,
    reasons: Vec<String>,
}

/// Score the bar at `index` and emit a `Signal`. `timestamp` is the bar's
/// timestamp (caller converts `Bar::date` to a `NaiveDateTime`); `entry_price`
/// is that bar's close.
#[allow(clippy::too_many_arguments)]
pub fn score(
    timestamp: chrono::NaiveDateTime,
    entry_price: f64,
    indicators: &IndicatorValues,
    index: usize,
    regime: &Regime,
    pattern: &PatternAnalysis,
    sentiment: &SentimentReport,
    config: &TuningConfig,
) -> Signal {
    let ema9 = indicators.get("ema_9", index).unwrap_or(f64::NAN);
    let ema21 = indicators.get("ema_21", index).unwrap_or(f64::NAN);
    let ema9_prev = if index > 0 { indicators.get("ema_9", index - 1).unwrap_or(f64::NAN) } else { f64::NAN };
    let ema21_prev = if index > 0 { indicators.get("ema_21", index - 1).unwrap_or(f64::NAN) } else { f64::NAN };
    let stoch_k = indicators.get("stoch_k", index).unwrap_or(f64::NAN);
    let atr = indicators.get("atr_14", index).unwrap_or(f64::NAN);

    let ema_cross = if !ema9.is_nan() && !ema21.is_nan() && !ema9_prev.is_nan() && !ema21_prev.is_nan() {
        if ema9_prev <= ema21_prev && ema9 > ema21 {
            Some(EmaCross::BullCross)
        } else if ema9_prev >= ema21_prev && ema9 < ema21 {
            Some(EmaCross::BearCross)
        } else if ema9 > ema21 {
            Some(EmaCross::BullAligned)
        } else {
            Some(EmaCross::BearAligned)
        }
    } else {
        None
    };

    let long = score_direction(true, regime.trend, ema_cross, stoch_k, pattern, sentiment);
    let short = score_direction(false, regime.trend, ema_cross, stoch_k, pattern, sentiment);

    let long_strength = SignalStrength::from_criteria_met(long.score);
    let short_strength = SignalStrength::from_criteria_met(short.score);

    if long_strength == SignalStrength::None && short_strength == SignalStrength::None {
        return Signal {
            timestamp,
            signal_type: SignalType::None,
            strength: SignalStrength::None,
            entry_price,
            regime_label: regime.trend,
            pattern_success_rate: pattern.bullish_success_rate.max(pattern.bearish_success_rate),
            sentiment_label: sentiment.label,
            criteria_met: long.score.max(short.score),
            criteria_total: CRITERIA_TOTAL,
            reasons: Vec::new(),
            stop_loss: 0.0,
            take_profit: 0.0,
            rr_ratio: 0.0,
        };
    }

    let (signal_type, strength, criteria_met, reasons, pattern_success_rate) = if long.score >= short.score {
        (SignalType::Long, long_strength, long.score, long.reasons, pattern.bullish_success_rate)
    } else {
        (SignalType::Short, short_strength, short.score, short.reasons, pattern.bearish_success_rate)
    };

    let (stop_loss, take_profit) = if signal_type == SignalType::Long {
        (entry_price - config.atr_stop_mult * atr, entry_price + config.atr_tp_mult * atr)
    } else {
        (entry_price + config.atr_stop_mult * atr, entry_price - config.atr_tp_mult * atr)
    };

    let stop_distance = (entry_price - stop_loss).abs();
    let rr_ratio = if stop_distance > 0.0 { (take_profit - entry_price).abs() / stop_distance } else { 0.0 };

    Signal {
        timestamp,
        signal_type,
        strength,
        entry_price,
        regime_label: regime.trend,
        pattern_success_rate,
        sentiment_label: sentiment.label,
        criteria_met,
        criteria_total: CRITERIA_TOTAL,
        reasons,
        stop_loss,
        take_profit,
        rr_ratio,
    }
}

fn score_direction(
    is_long: bool,
    trend: Trend,
    ema_cross: Option<EmaCross>,
    stoch_k: f64,
    pattern: &PatternAnalysis,
    sentiment: &SentimentReport,
) -> DirectionScore {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    // Criterion 1: trend direction.
    let trend_fires = if is_long {
        matches!(trend, Trend::StrongUptrend | Trend::WeakUptrend)
    } else {
        matches!(trend, Trend::StrongDowntrend | Trend::WeakDowntrend)
    };
    if trend_fires {
        score += 1.0;
        reasons.push(format!("trend is {trend:?}"));
    }

    // Criterion 2: EMA9/EMA21 cross or alignment.
    if let Some(cross) = ema_cross {
        if is_long {
            if cross == EmaCross::BullCross {
                score += 1.0;
                reasons.push("EMA9 crossed above EMA21".to_string());
            } else if cross == EmaCross::BullAligned {
                score += 0.5;
                reasons.push("EMA9 above EMA21".to_string());
            }
        } else if cross == EmaCross::BearCross {
            score += 1.0;
            reasons.push("EMA9 crossed below EMA21".to_string());
        } else if cross == EmaCross::BearAligned {
            score += 0.5;
            reasons.push("EMA9 below EMA21".to_string());
        }
    }

    // Criterion 3: stochastic level.
    if !stoch_k.is_nan() {
        if is_long {
            if stoch_k < 30.0 {
                score += 1.0;
                reasons.push(format!("Stoch_K {stoch_k:.1} oversold"));
            } else if stoch_k < 50.0 {
                score += 0.5;
                reasons.push(format!("Stoch_K {stoch_k:.1} below midline"));
            }
        } else if stoch_k > 70.0 {
            score += 1.0;
            reasons.push(format!("Stoch_K {stoch_k:.1} overbought"));
        } else if stoch_k > 50.0 {
            score += 0.5;
            reasons.push(format!("Stoch_K {stoch_k:.1} above midline"));
        }
    }

    // Criterion 4: pattern success rate.
    let pattern_rate = if is_long { pattern.bullish_success_rate } else { pattern.bearish_success_rate };
    if pattern_rate > 60.0 {
        score += 1.0;
        reasons.push(format!("historical analogues succeed {pattern_rate:.0}% of the time"));
    }

    // Criterion 5: sentiment alignment.
    let target_label = if is_long { SentimentLabel::RiskOn } else { SentimentLabel::RiskOff };
    if sentiment.label == target_label {
        score += 1.0;
        reasons.push(format!("sentiment is {:?}", sentiment.label));
    } else if sentiment.label == SentimentLabel::Neutral {
        score += 0.5;
        reasons.push("sentiment is neutral".to_string());
    }

    DirectionScore { score, reasons }
}
