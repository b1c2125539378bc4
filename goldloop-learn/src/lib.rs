//! # Goldloop Learn
//!
//! The learning subsystem: signal log, live auto-logger, performance
//! analyzer, and the self-improvement loop (pattern miner, genetic rule
//! evolver, grid-search auto-tuner, version-gated strategy factory, and
//! the feedback loop that watches for degradation and requests
//! re-optimization).
//!
//! ## Components
//!
//! - `signal_log`: append-only `SignalRecord` store with outcome tracking
//! - `auto_logger`: polls a tick feed, opens/closes `PaperTrade`s against fixed SL/TP/expiry
//! - `performance`: aggregate and segmented metrics over completed outcomes
//! - `pattern_miner`: discovers `DiscoveredPattern`s across four families
//! - `rule_evolver`: genetic search over a population of `TradingRule`s
//! - `auto_tuner`: grid search over `TuningConfig` scalars
//! - `strategy_factory`: orchestrates the learning cycle and gates deploys
//! - `feedback_loop`: monitors recent performance, triggers re-optimization
//! - `multi_config_tester`: runs N Auto-Logger configurations over the same
//!   tick history in parallel, each against its own private store

pub mod auto_logger;
pub mod auto_logger_store;
pub mod auto_tuner;
pub mod domain;
pub mod error;
pub mod feedback_loop;
pub mod multi_config_tester;
pub mod pattern_miner;
pub mod performance;
pub mod rule_evolver;
pub mod signal_log;
pub mod strategy_factory;

pub use auto_logger::{AutoLogger, AutoLoggerConfig, LoggerStats};
pub use auto_logger_store::AutoLoggerStore;
pub use domain::{
    Condition, DiscoveredPattern, Direction, FirebaseConfig, Operator, OutcomeRecord, PaperTrade, PatternFamily,
    PriceSnapshot, ProductionConfig, SignalRecord, SignalStatus, StrategyVersion, StrategyVersionsDocument, TradeResult,
    TradeStatus, TradingRule, WinLoss,
};
pub use error::{LearnError, Result};
pub use multi_config_tester::{run_sweep, CandidateConfig, CandidateResult};
pub use signal_log::{SignalLog, SignalLogDocument};
pub use strategy_factory::{FactoryConfig, IterationOutcome, IterationStatus, LoopArtifacts, StrategyFactory};
