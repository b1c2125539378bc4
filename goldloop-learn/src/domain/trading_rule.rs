//! `TradingRule` — an evolvable, weighted voting unit: structurally a
//! discovered pattern plus genetic-algorithm metadata.

use crate::domain::Direction;
use goldloop_core::domain::{Session, Trend};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Lt,
    Gt,
}

impl Operator {
    pub fn evaluate(&self, value: f64, threshold: f64) -> bool {
        match self {
            Operator::Lt => value < threshold,
            Operator::Gt => value > threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Condition {
    pub op: Operator,
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingRule {
    pub rule_id: String,
    pub generation: u32,
    pub conditions: BTreeMap<String, Condition>,
    pub regime_filter: Option<Trend>,
    pub session_filter: Option<Session>,
    pub direction: Direction,
    pub weight: u8,
    pub fitness: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_trades: usize,
    pub parent_ids: Vec<String>,
    pub mutations: Vec<String>,
}

impl TradingRule {
    /// Whether a single `OutcomeRecord`'s indicator readings satisfy every
    /// declared condition, plus any regime/session filter.
    pub fn matches(
        &self,
        indicator_values: &BTreeMap<&str, f64>,
        regime: Trend,
        session: Session,
        direction: Direction,
    ) -> bool {
        if self.direction != direction {
            return false;
        }
        if let Some(r) = self.regime_filter {
            if r != regime {
                return false;
            }
        }
        if let Some(s) = self.session_filter {
            if s != session {
                return false;
            }
        }
        self.conditions.iter().all(|(indicator, cond)| {
            indicator_values
                .get(indicator.as_str())
                .is_some_and(|&v| cond.op.evaluate(v, cond.threshold))
        })
    }
}
