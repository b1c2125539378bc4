//! End-to-end coverage of the learning cycle's commit point: the first
//! iteration always deploys with no prior version, a second iteration
//! only replaces it once the configured win-rate improvement clears,
//! and the feedback loop's degradation trigger is what drives
//! `run_if_degraded` into actually running an iteration.

use chrono::NaiveDate;

use goldloop_core::domain::{Session, Trend, TuningConfig};
use goldloop_learn::domain::{Direction, OutcomeRecord, WinLoss};
use goldloop_learn::strategy_factory::{FactoryConfig, IterationStatus};
use goldloop_learn::StrategyFactory;

fn base_ts() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn outcome_row(i: i64, outcome: WinLoss, pnl: f64) -> OutcomeRecord {
    OutcomeRecord {
        timestamp: base_ts() + chrono::Duration::hours(i),
        price: 2000.0,
        rsi: 30.0 + (i % 40) as f64,
        stoch_k: 20.0 + (i % 60) as f64,
        adx: 25.0,
        atr_percentile: 50.0,
        regime: Trend::Ranging,
        session: Session::London,
        direction: if i % 2 == 0 { Direction::Long } else { Direction::Short },
        outcome,
        pnl,
        hold_minutes: 60,
        score: 65.0,
        rule_ids: Vec::new(),
    }
}

fn small_evolver_config() -> FactoryConfig {
    let mut config = FactoryConfig::default();
    config.evolver.generations = 1;
    config.evolver.population_size = 10;
    config
}

#[test]
fn a_full_learning_cycle_deploys_first_then_gates_the_second() {
    let mut factory = StrategyFactory::new(small_evolver_config(), TuningConfig::default());

    let healthy_history: Vec<OutcomeRecord> = (0..80)
        .map(|i| outcome_row(i, if i % 4 == 0 { WinLoss::Loss } else { WinLoss::Win }, if i % 4 == 0 { -8.0 } else { 12.0 }))
        .collect();

    let first = factory.run_iteration(0, &healthy_history, 11);
    assert!(matches!(first.status, IterationStatus::Deployed));
    let deployed_version = factory.active_version().expect("first iteration deploys").clone();
    assert!(factory.export().is_some());

    // A second iteration over the same, unchanged history should not
    // find enough improvement to displace the just-deployed version.
    let second = factory.run_iteration(1, &healthy_history, 11);
    match second.status {
        IterationStatus::NotDeployed { .. } => {
            assert_eq!(factory.active_version().unwrap().version_id, deployed_version.version_id);
        }
        IterationStatus::Deployed => {
            // Identical history with the same seed can only legitimately
            // redeploy if it cleared the improvement bar; either way the
            // active version must still be exportable.
            assert!(factory.export().is_some());
        }
        IterationStatus::Failed { phase, reason } => panic!("second iteration unexpectedly failed in {phase}: {reason}"),
    }
}

#[test]
fn degraded_recent_performance_flows_through_to_a_deployed_iteration() {
    let mut factory = StrategyFactory::new(small_evolver_config(), TuningConfig::default());
    let now = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();

    // 30-day window: strong win rate. 7-day window: clearly degraded.
    let mut history: Vec<OutcomeRecord> = (0..20)
        .map(|i| {
            let mut row = outcome_row(i, WinLoss::Win, 12.0);
            row.timestamp = now - chrono::Duration::days(10 + i);
            row
        })
        .collect();
    history.extend((0..8).map(|i| {
        let outcome = if i % 2 == 0 { WinLoss::Win } else { WinLoss::Loss };
        let mut row = outcome_row(i, outcome, if outcome == WinLoss::Win { 8.0 } else { -12.0 });
        row.timestamp = now - chrono::Duration::days(i);
        row
    }));

    let outcome = factory.run_if_degraded(0, &history, now, 5).expect("degradation should trigger an iteration");
    assert!(matches!(outcome.status, IterationStatus::Deployed));
    assert!(factory.active_version().is_some());
}

#[test]
fn healthy_history_never_reaches_the_deploy_gate_via_the_feedback_loop() {
    let mut factory = StrategyFactory::new(small_evolver_config(), TuningConfig::default());
    let now = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    let history: Vec<OutcomeRecord> = (0..40)
        .map(|i| {
            let mut row = outcome_row(i, if i % 12 == 0 { WinLoss::Loss } else { WinLoss::Win }, if i % 12 == 0 { -3.0 } else { 10.0 });
            row.timestamp = now - chrono::Duration::days(i);
            row
        })
        .collect();

    assert!(factory.run_if_degraded(0, &history, now, 5).is_none());
    assert!(factory.active_version().is_none());
}
