//! Domain types owned by the learning subsystem: the persisted signal
//! record and its outcome, paper trades, discovered patterns, evolvable
//! rules, strategy versions, and the unifying outcome record the miner,
//! evolver, tuner, and performance analyzer all consume.

pub mod discovered_pattern;
pub mod outcome_record;
pub mod paper_trade;
pub mod signal_record;
pub mod trading_rule;
pub mod version;

pub use discovered_pattern::{DiscoveredPattern, PatternFamily};
pub use outcome_record::{Direction, OutcomeRecord, WinLoss};
pub use paper_trade::{PaperTrade, TradeStatus};
pub use signal_record::{Outcome, PriceSnapshot, SignalRecord, SignalStatus, TradeResult};
pub use trading_rule::{Condition, Operator, TradingRule};
pub use version::{FirebaseConfig, ProductionConfig, StrategyVersion, StrategyVersionsDocument};
