// src/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A held quantity of a ticker with an optional average acquisition cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_cost: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    Growth,
    Hold,
    Diversify,
}

impl Strategy {
    /// Case-insensitive; anything unrecognised is treated as `Hold`.
    pub fn from_engine(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "growth" => Strategy::Growth,
            "diversify" => Strategy::Diversify,
            _ => Strategy::Hold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    InvestNow,
    PartialDeploy,
    Wait,
    Rebalance,
}

impl Action {
    /// Case-insensitive; missing or unrecognised decisions mean `Wait`.
    pub fn from_engine(value: Option<&str>) -> Self {
        match value.unwrap_or_default().to_lowercase().as_str() {
            "invest_now" => Action::InvestNow,
            "partial_deploy" => Action::PartialDeploy,
            "rebalance" => Action::Rebalance,
            _ => Action::Wait,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationBreakdown {
    pub equities: f64,
    pub defensive: f64,
    pub cash: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidationCondition {
    pub metric: String,
    pub op: String,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredRule {
    pub rule_id: String,
    pub name: String,
    pub weight: f64,
    pub direction: String,
    pub inputs_used: BTreeMap<String, serde_json::Value>,
    pub rationale_key: String,
}

/// A recommendation as shown to the user, mapped from an engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResult {
    pub strategy: Strategy,
    pub action: Action,
    pub amount: f64,
    pub allocation: AllocationBreakdown,
    pub confidence: f64,
    pub invalidated_if: Vec<InvalidationCondition>,
    pub explanation_summary: String,
    pub triggered_rules: Vec<TriggeredRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recession_probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub cash_amount: f64,
    pub monthly_contribution: f64,
    /// 0 (cautious) to 100 (aggressive).
    pub risk_tolerance: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub cash_amount: f64,
    pub monthly_contribution: f64,
    pub risk_tolerance: u8,
    pub positions: Vec<Position>,
}

/// A stored [`EngineResult`] for a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub portfolio_id: String,
    pub strategy: Strategy,
    pub action: Action,
    pub amount: f64,
    pub allocation: AllocationBreakdown,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recession_probability: Option<f64>,
    pub explanation_summary: String,
    pub triggered_rules: Vec<TriggeredRule>,
    pub invalidated_if: Vec<InvalidationCondition>,
    pub created_at: DateTime<Utc>,
}
