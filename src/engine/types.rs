// src/engine/types.rs

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Strategy requested from the engine, derived from risk tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStrategy {
    Hold,
    Diversify,
    Growth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunPosition {
    pub ticker: String,
    pub quantity: f64,
    pub avg_cost: f64,
    pub cost_currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunPayload {
    pub run_id: String,
    pub strategy: RunStrategy,
    pub cash: f64,
    pub positions: Vec<RunPosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedStock {
    pub ticker: String,
    #[serde(default)]
    pub allocation: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShortlistBucket {
    #[serde(default)]
    pub suggested_stocks: Vec<SuggestedStock>,
}

/// One named strategy evaluation in a run response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub strategy: String,
    #[serde(default)]
    pub decision: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub allocation: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub shortlist: Vec<ShortlistBucket>,
    #[serde(default)]
    pub rule_trace: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub candidates_new_assets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResponse {
    /// Keyed by strategy name, in the order the engine returned them.
    pub results: IndexMap<String, StrategyResult>,
}
