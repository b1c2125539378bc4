//! Domain types.

pub mod bar;
pub mod config;
pub mod ids;
pub mod pattern;
pub mod regime;
pub mod sentiment;
pub mod setup;
pub mod signal;

pub use bar::Bar;
pub use config::TuningConfig;
pub use ids::RunId;
pub use pattern::{PatternAnalysis, PatternMatch, PatternPrediction};
pub use regime::{Liquidity, Regime, RegimeSummary, Session, Trend, Volatility};
pub use sentiment::{CorrelationEntry, SentimentLabel, SentimentReport};
pub use setup::{EmaCross, Level, Setup};
pub use signal::{Signal, SignalStrength, SignalType};

/// Symbol type alias.
pub type Symbol = String;
