//! Goldloop CLI — offline gold-futures analysis, signal emission, tick
//! monitoring, the live Auto-Logger, and the self-improvement loop.
//!
//! Commands:
//! - `run_analysis` — full snapshot (indicators, regime, sentiment, pattern, signal) for the latest bar
//! - `run_signals` — emit and log a single signal
//! - `run_monitor` — poll a tick feed and print regime/sentiment context
//! - `run_auto_logger` — poll a tick feed, open/close paper trades against fixed SL/TP
//! - `run_strategy_factory` — Pattern Miner -> Rule Evolver -> Auto-Tuner -> Strategy Factory

mod config;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rand::SeedableRng;

use goldloop_core::data::{BarSource, BarStore, CsvBarSource, JsonFileTickSource, TickSource};
use goldloop_core::domain::Bar;
use goldloop_learn::{AutoLogger, AutoLoggerStore, SignalLog, StrategyFactory};

use config::RunConfig;

/// Basket symbols read alongside the primary gold series for sentiment
/// analysis. Any file missing from `bars_dir` is simply absent from the
/// basket, per `CsvBarSource`'s permissive contract.
const BASKET_SYMBOLS: &[&str] = &["USD", "EQUITY", "SILVER", "CRUDE", "YIELD10"];
const GOLD_SYMBOL: &str = "XAUUSD";
const WIDE_START: &str = "1990-01-01";
const WIDE_END: &str = "2100-01-01";

#[derive(Parser)]
#[command(name = "goldloop", about = "Offline gold-futures trading-intelligence engine")]
struct Cli {
    /// Path to a TOML config file; missing is not an error, falls back to defaults.
    #[arg(long, global = true, default_value = "goldloop.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Full analysis snapshot over the most recent bar.
    #[command(name = "run_analysis")]
    RunAnalysis {
        #[arg(long, default_value_t = 365)]
        days: i64,
        #[arg(long)]
        no_charts: bool,
    },
    /// Emit and log a single signal from the latest bar.
    #[command(name = "run_signals")]
    RunSignals {
        #[arg(long, default_value_t = 365)]
        days: i64,
        #[arg(long)]
        no_dashboard: bool,
    },
    /// Poll a tick feed and print the regime/sentiment context once or continuously.
    #[command(name = "run_monitor")]
    RunMonitor {
        #[arg(long)]
        continuous: bool,
        #[arg(long, default_value_t = 10)]
        interval: u64,
        #[arg(long)]
        test: bool,
        #[arg(long, default_value = "tick.json")]
        tick_file: PathBuf,
    },
    /// Run the live Auto-Logger against a polled tick feed.
    #[command(name = "run_auto_logger")]
    RunAutoLogger {
        #[arg(long)]
        sl: Option<f64>,
        #[arg(long)]
        tp: Option<f64>,
        #[arg(long)]
        min_score: Option<f64>,
        #[arg(long, default_value_t = 10)]
        interval: u64,
        #[arg(long)]
        expiry: Option<i64>,
        #[arg(long)]
        db: Option<String>,
        #[arg(long)]
        stats: bool,
        #[arg(long)]
        export: Option<PathBuf>,
        #[arg(long)]
        test: bool,
        #[arg(long, default_value = "tick.json")]
        tick_file: PathBuf,
    },
    /// Run the self-improvement loop: Miner -> Evolver -> Tuner -> Factory.
    #[command(name = "run_strategy_factory")]
    RunStrategyFactory {
        #[arg(long)]
        continuous: bool,
        #[arg(long, default_value_t = 24)]
        interval: u64,
        #[arg(long, default_value_t = 1)]
        iterations: u64,
        #[arg(long)]
        report: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = RunConfig::load(&cli.config).context("loading run configuration")?;
    tracing::info!(config_id = %config.config_id(), "resolved run configuration");

    match cli.command {
        Command::RunAnalysis { days, no_charts } => run_analysis(&config, days, no_charts),
        Command::RunSignals { days, no_dashboard } => run_signals(&config, days, no_dashboard),
        Command::RunMonitor { continuous, interval, test, tick_file } => {
            run_monitor(&config, continuous, interval, test, &tick_file)
        }
        Command::RunAutoLogger { sl, tp, min_score, interval, expiry, db, stats, export, test, tick_file } => {
            run_auto_logger(&config, sl, tp, min_score, interval, expiry, db, stats, export, test, &tick_file)
        }
        Command::RunStrategyFactory { continuous, interval, iterations, report } => {
            run_strategy_factory(&config, continuous, interval, iterations, report)
        }
    }
}

/// Load the gold series plus every basket series present under `bars_dir`,
/// then upsert the gold series into the persistent store. A wide fixed date
/// range is used since `CsvBarSource` ignores any row outside it and an
/// absent file yields an empty series regardless of range.
fn load_bars(config: &RunConfig, days: i64) -> anyhow::Result<(Vec<Bar>, BTreeMap<String, Vec<Bar>>)> {
    let source = CsvBarSource::new(&config.bars_dir);
    let start: NaiveDate = WIDE_START.parse().expect("valid constant date");
    let end: NaiveDate = WIDE_END.parse().expect("valid constant date");

    let mut store = BarStore::open(&config.store_path).context("opening bar store")?;
    let raw_gold = source.fetch(GOLD_SYMBOL, start, end);
    store.upsert_bars(GOLD_SYMBOL, &raw_gold).context("persisting gold bars")?;

    let mut gold = store.load_bars(GOLD_SYMBOL, start, end).context("loading gold bars from store")?;
    if days > 0 && gold.len() as i64 > days {
        let cut = gold.len() - days as usize;
        gold = gold.split_off(cut);
    }

    let mut basket = BTreeMap::new();
    for &symbol in BASKET_SYMBOLS {
        let raw = source.fetch(symbol, start, end);
        if raw.is_empty() {
            continue;
        }
        let bars: Vec<Bar> = raw.into_iter().map(|r| to_bar(symbol, r)).collect();
        basket.insert(symbol.to_string(), bars);
    }

    Ok((gold, basket))
}

fn to_bar(symbol: &str, raw: goldloop_core::data::RawBar) -> Bar {
    Bar { symbol: symbol.to_string(), date: raw.timestamp, open: raw.open, high: raw.high, low: raw.low, close: raw.close, volume: raw.volume }
}

fn run_analysis(config: &RunConfig, days: i64, no_charts: bool) -> anyhow::Result<()> {
    let (gold, basket) = load_bars(config, days)?;
    let Some(snapshot) = goldloop_core::pipeline::analyze_latest(&gold, &basket, &config.tuning) else {
        println!("no analysis available: empty history or insufficient warm-up ({} bars loaded)", gold.len());
        return Ok(());
    };

    println!("regime summary: {:?}", snapshot.regime_summary);
    println!("sentiment: {:?} (confidence {:.2})", snapshot.sentiment.label, snapshot.sentiment.confidence);
    println!(
        "pattern analysis: {:?} ({} matches, confidence {:.2}, bullish {:.1}% / bearish {:.1}%)",
        snapshot.pattern.prediction,
        snapshot.pattern.matches_found,
        snapshot.pattern.confidence,
        snapshot.pattern.bullish_success_rate,
        snapshot.pattern.bearish_success_rate
    );
    println!(
        "signal: {:?} strength={:?} entry={:.2} sl={:.2} tp={:.2} rr={:.2}",
        snapshot.signal.signal_type,
        snapshot.signal.strength,
        snapshot.signal.entry_price,
        snapshot.signal.stop_loss,
        snapshot.signal.take_profit,
        snapshot.signal.rr_ratio
    );
    if !no_charts {
        for reason in &snapshot.signal.reasons {
            println!("  - {reason}");
        }
    }
    Ok(())
}

fn run_signals(config: &RunConfig, days: i64, no_dashboard: bool) -> anyhow::Result<()> {
    let (gold, basket) = load_bars(config, days)?;
    let Some(snapshot) = goldloop_core::pipeline::analyze_latest(&gold, &basket, &config.tuning) else {
        println!("no signal available: empty history or insufficient warm-up ({} bars loaded)", gold.len());
        return Ok(());
    };

    let mut log = load_signal_log(config)?;
    let mut rng = rand::rngs::StdRng::seed_from_u64(blake3::hash(snapshot.signal.timestamp.to_string().as_bytes()).as_bytes()[0] as u64);
    let indicators_at_entry: BTreeMap<String, f64> =
        ["ema_9", "ema_21", "ema_50", "adx_14", "atr_14", "stoch_k", "rsi_14"]
            .iter()
            .filter_map(|name| snapshot.indicators.get(name, gold.len() - 1).map(|v| (name.to_string(), v)))
            .collect();
    let id = log.log(
        snapshot.signal.clone(),
        indicators_at_entry,
        snapshot.sentiment.correlations.clone(),
        config.tuning.clone(),
        &mut rng,
    );
    save_signal_log(config, &log)?;

    println!("logged signal {id}: {:?} strength={:?}", snapshot.signal.signal_type, snapshot.signal.strength);
    if !no_dashboard {
        println!("  regime: {:?}", snapshot.signal.regime_label);
        println!("  sentiment: {:?}", snapshot.signal.sentiment_label);
        println!("  pattern success rate: {:.1}%", snapshot.signal.pattern_success_rate);
    }
    Ok(())
}

fn signal_log_path(config: &RunConfig) -> PathBuf {
    PathBuf::from(&config.artifacts_dir).join("signal_log.json")
}

fn load_signal_log(config: &RunConfig) -> anyhow::Result<SignalLog> {
    let path = signal_log_path(config);
    let Ok(text) = std::fs::read_to_string(&path) else {
        return Ok(SignalLog::new());
    };
    let document: goldloop_learn::SignalLogDocument = serde_json::from_str(&text).context("parsing signal log document")?;
    Ok(SignalLog::from_records(document.signals))
}

fn save_signal_log(config: &RunConfig, log: &SignalLog) -> anyhow::Result<()> {
    let path = signal_log_path(config);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("creating artifacts directory")?;
    }
    let now = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    let document = log.to_document(now);
    let json = serde_json::to_string_pretty(&document).context("serializing signal log document")?;
    std::fs::write(&path, json).context("writing signal log document")?;
    Ok(())
}

fn run_monitor(config: &RunConfig, continuous: bool, interval: u64, test: bool, tick_file: &std::path::Path) -> anyhow::Result<()> {
    let source = JsonFileTickSource::new(tick_file);
    let (gold, basket) = load_bars(config, 365)?;
    let snapshot = goldloop_core::pipeline::analyze_latest(&gold, &basket, &config.tuning);

    loop {
        match source.poll() {
            Some(tick) => {
                println!("tick: price={:?} score_long={:?} score_short={:?}", tick.price, tick.score_long, tick.score_short);
                if let Some(snapshot) = &snapshot {
                    let trend = snapshot.regime_summary.most_recent.as_ref().map(|r| r.trend);
                    println!("  current regime: {trend:?}");
                    println!("  current sentiment: {:?}", snapshot.sentiment.label);
                }
            }
            None => println!("monitor: no tick available"),
        }
        if test || !continuous {
            break;
        }
        std::thread::sleep(std::time::Duration::from_secs(interval));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_auto_logger(
    config: &RunConfig,
    sl: Option<f64>,
    tp: Option<f64>,
    min_score: Option<f64>,
    interval: u64,
    expiry: Option<i64>,
    db: Option<String>,
    stats: bool,
    export: Option<PathBuf>,
    test: bool,
    tick_file: &std::path::Path,
) -> anyhow::Result<()> {
    let db_path = db.unwrap_or_else(|| config.auto_logger_db.clone());
    let store = AutoLoggerStore::open(&db_path).context("opening auto-logger store")?;

    let mut logger_config = config.auto_logger.clone();
    if let Some(sl) = sl {
        logger_config.stop_loss_points = sl;
    }
    if let Some(tp) = tp {
        logger_config.take_profit_points = tp;
    }
    if let Some(min_score) = min_score {
        logger_config.min_score = min_score;
    }
    if let Some(expiry) = expiry {
        logger_config.signal_expiry_minutes = expiry;
    }

    let mut logger = AutoLogger::new(logger_config);
    logger.recover_open_trades(store.load_all_trades().context("recovering open trades")?);

    if stats {
        let all = store.load_all_trades().context("loading trades for stats")?;
        let summary = goldloop_learn::auto_logger::stats_over(&all);
        println!(
            "auto-logger stats: total={} wins={} losses={} win_rate={:.1}% profit_factor={:.2} total_pnl={:.2}",
            summary.total, summary.wins, summary.losses, summary.win_rate, summary.profit_factor, summary.total_pnl
        );
        return Ok(());
    }

    if let Some(export_path) = export {
        let all = store.load_all_trades().context("loading trades for export")?;
        let json = serde_json::to_string_pretty(&all).context("serializing trades for export")?;
        std::fs::write(&export_path, json).context("writing export file")?;
        println!("exported {} trades to {}", all.len(), export_path.display());
        return Ok(());
    }

    let tick_source = JsonFileTickSource::new(tick_file);
    loop {
        if let Some(tick) = tick_source.poll() {
            let now = chrono::Utc::now().naive_utc();
            logger.on_tick(&tick, now).context("processing tick")?;
            for trade in logger.open_trades() {
                store.upsert_trade(trade).context("persisting open trade")?;
            }
            for trade in logger.closed_trades() {
                store.upsert_trade(trade).context("persisting closed trade")?;
            }
            if let Some(price) = tick.price {
                store.record_price(now, price).context("recording tick price")?;
            }
        }
        if test {
            break;
        }
        std::thread::sleep(std::time::Duration::from_secs(interval));
    }
    Ok(())
}

fn run_strategy_factory(config: &RunConfig, continuous: bool, interval: u64, iterations: u64, report: bool) -> anyhow::Result<()> {
    let auto_store = AutoLoggerStore::open(&config.auto_logger_db).context("opening auto-logger store")?;
    let closed = auto_store.load_all_trades().context("loading closed trades for history")?;
    let history: Vec<goldloop_learn::OutcomeRecord> = closed.iter().filter_map(outcome_record_from_trade).collect();

    let mut factory = StrategyFactory::new(config.factory.clone(), config.tuning.clone());
    let seed = blake3::hash(config.config_id().as_bytes()).as_bytes()[0] as u64;

    loop {
        let outcomes = factory.run_the_loop(iterations.max(1), &history, seed);
        for outcome in &outcomes {
            match &outcome.status {
                goldloop_learn::IterationStatus::Deployed => {
                    if let Some(version) = &outcome.version {
                        println!("{}", version.version_id);
                    }
                }
                goldloop_learn::IterationStatus::NotDeployed { reason } => {
                    println!("iteration {} not deployed: {reason}", outcome.iteration);
                }
                goldloop_learn::IterationStatus::Failed { phase, reason } => {
                    println!("iteration {} failed in {phase}: {reason}", outcome.iteration);
                }
            }
        }
        if report {
            let artifacts = factory.export_artifacts();
            match artifacts.production_config {
                Some(ref production) => {
                    println!("active version {}: {} rules", production.version_id, production.rules.len());
                }
                None => println!("no active version yet"),
            }
            write_loop_artifacts(&config.artifacts_dir, &artifacts)?;
        }
        if !continuous {
            break;
        }
        std::thread::sleep(std::time::Duration::from_secs(interval * 3600));
    }
    Ok(())
}

/// Write each named artifact in the learning cycle's bundle to its own
/// file under `artifacts_dir`, matching the source's one-JSON-file-per-
/// artifact layout. The Pine-bound rules share the evolved rules' shape
/// since the Pine Script text emitter itself stays out of scope.
fn write_loop_artifacts(artifacts_dir: &str, artifacts: &goldloop_learn::LoopArtifacts) -> anyhow::Result<()> {
    let dir = std::path::Path::new(artifacts_dir);
    std::fs::create_dir_all(dir).context("creating artifacts directory")?;

    write_json_artifact(dir, "discovered_patterns.json", &artifacts.discovered_patterns)?;
    write_json_artifact(dir, "evolved_rules.json", &artifacts.evolved_rules)?;
    write_json_artifact(dir, "pine_rules.json", &artifacts.pine_rules)?;
    write_json_artifact(dir, "optimized_config.json", &artifacts.optimized_config)?;
    write_json_artifact(dir, "firebase_config.json", &artifacts.firebase_config)?;
    write_json_artifact(dir, "strategy_versions.json", &artifacts.strategy_versions)?;
    if let Some(production) = &artifacts.production_config {
        write_json_artifact(dir, "production_config.json", production)?;
    }
    write_json_artifact(dir, "loop_results.json", &artifacts.loop_results)?;
    Ok(())
}

fn write_json_artifact<T: serde::Serialize>(dir: &std::path::Path, name: &str, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).with_context(|| format!("serializing {name}"))?;
    std::fs::write(dir.join(name), json).with_context(|| format!("writing {name}"))
}

/// Map a closed `PaperTrade` to the labeled `OutcomeRecord` history row the
/// learning cycle consumes. Still-open trades have no resolvable outcome
/// and are skipped.
fn outcome_record_from_trade(trade: &goldloop_learn::PaperTrade) -> Option<goldloop_learn::OutcomeRecord> {
    use goldloop_learn::{Direction as LearnDirection, TradeStatus, WinLoss};

    let outcome = match trade.status {
        TradeStatus::Win => WinLoss::Win,
        TradeStatus::Loss => WinLoss::Loss,
        TradeStatus::Expired | TradeStatus::Open => return None,
    };
    let exit_ts = trade.exit_ts?;
    let hold_minutes = (exit_ts - trade.open_ts).num_minutes();
    let regime = trade.regime.as_deref().and_then(parse_trend).unwrap_or(goldloop_core::domain::Trend::Ranging);
    let direction = match trade.direction {
        LearnDirection::Long => goldloop_learn::Direction::Long,
        LearnDirection::Short => goldloop_learn::Direction::Short,
    };

    Some(goldloop_learn::OutcomeRecord {
        timestamp: trade.open_ts,
        price: trade.entry,
        rsi: trade.rsi.unwrap_or(50.0),
        stoch_k: trade.stoch.unwrap_or(50.0),
        adx: 0.0, // ticks never carry ADX, only rsi/stoch/atr
        atr_percentile: 50.0,
        regime,
        session: trade.session.unwrap_or(goldloop_core::domain::Session::London),
        direction,
        outcome,
        pnl: trade.pnl.unwrap_or(0.0),
        hold_minutes,
        score: trade.score_long.max(trade.score_short),
        rule_ids: Vec::new(),
    })
}

fn parse_trend(s: &str) -> Option<goldloop_core::domain::Trend> {
    use goldloop_core::domain::Trend;
    match s {
        "StrongUptrend" => Some(Trend::StrongUptrend),
        "WeakUptrend" => Some(Trend::WeakUptrend),
        "Ranging" => Some(Trend::Ranging),
        "WeakDowntrend" => Some(Trend::WeakDowntrend),
        "StrongDowntrend" => Some(Trend::StrongDowntrend),
        _ => None,
    }
}
