// src/engine/mod.rs
//! Client for the external stock-picker engine and mapping of its answers.

pub mod types;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::{header::ACCEPT, Client};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

pub use types::{
    RunPayload, RunPosition, RunResponse, RunStrategy, ShortlistBucket, StrategyResult,
    SuggestedStock,
};

use crate::models::{Action, AllocationBreakdown, EngineResult, Position, Strategy, TriggeredRule};

const RUN_PATH: &str = "/stock-picker/run";

pub fn strategy_from_risk_tolerance(risk_tolerance: u8) -> RunStrategy {
    if risk_tolerance >= 67 {
        RunStrategy::Growth
    } else if risk_tolerance >= 34 {
        RunStrategy::Diversify
    } else {
        RunStrategy::Hold
    }
}

/// Accept either the full run endpoint or an API base URL.
pub fn resolve_run_url(base_or_url: &str) -> String {
    if base_or_url.ends_with(RUN_PATH) {
        return base_or_url.to_string();
    }
    let base = base_or_url.strip_suffix('/').unwrap_or(base_or_url);
    format!("{}{}", base, RUN_PATH)
}

/// Build a run request with a fresh run id. Missing costs are sent as 0.
pub fn build_payload(
    risk_tolerance: u8,
    cash: f64,
    positions: &[Position],
    currency: &str,
) -> RunPayload {
    RunPayload {
        run_id: Uuid::new_v4().to_string(),
        strategy: strategy_from_risk_tolerance(risk_tolerance),
        cash,
        positions: positions
            .iter()
            .map(|p| RunPosition {
                ticker: p.ticker.clone(),
                quantity: p.quantity,
                avg_cost: p.avg_cost.unwrap_or(0.0),
                cost_currency: currency.to_string(),
            })
            .collect(),
    }
}

/// HTTP client for the run endpoint. No retries or timeouts are applied.
#[derive(Clone)]
pub struct StockPickerClient {
    client: Client,
    run_url: Url,
}

impl StockPickerClient {
    pub fn new(client: Client, base_or_url: &str) -> Result<Self> {
        let resolved = resolve_run_url(base_or_url);
        let run_url =
            Url::parse(&resolved).with_context(|| format!("invalid stock picker url {resolved}"))?;
        Ok(Self { client, run_url })
    }

    pub fn run_url(&self) -> &Url {
        &self.run_url
    }

    #[tracing::instrument(level = "info", skip_all, fields(run_id = %payload.run_id))]
    pub async fn run(&self, payload: &RunPayload, token: &str) -> Result<RunResponse> {
        let resp = self
            .client
            .post(self.run_url.clone())
            .header(ACCEPT, "application/json")
            .bearer_auth(token)
            .json(payload)
            .send()
            .await
            .context("stock picker request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "stock picker rejected run");
            bail!("Failed to run stock picker ({}): {}", status.as_u16(), body);
        }

        let response: RunResponse = resp
            .json()
            .await
            .context("decoding stock picker response")?;
        info!(results = response.results.len(), "stock picker run completed");
        Ok(response)
    }
}

/// JS-style truthiness: null, false, 0, NaN and "" count as missing.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn number_of(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

fn map_rule(index: usize, item: &serde_json::Map<String, Value>) -> TriggeredRule {
    let field = |key: &str| present(item.get(key));
    TriggeredRule {
        rule_id: field("rule_id")
            .map(text_of)
            .unwrap_or_else(|| format!("rule_{}", index + 1)),
        name: field("name")
            .or_else(|| field("rationale_key"))
            .map(text_of)
            .unwrap_or_else(|| "Rule".to_string()),
        weight: field("weight").map(number_of).unwrap_or(0.0),
        direction: field("direction")
            .map(text_of)
            .unwrap_or_else(|| "neutral".to_string()),
        inputs_used: match field("inputs_used") {
            Some(Value::Object(map)) => map.clone().into_iter().collect(),
            _ => BTreeMap::new(),
        },
        rationale_key: field("rationale_key")
            .map(text_of)
            .unwrap_or_else(|| "external_engine".to_string()),
    }
}

/// Missing or non-numeric shares read as 0.
fn map_allocation(allocation: Option<&serde_json::Map<String, Value>>) -> AllocationBreakdown {
    let Some(allocation) = allocation else {
        return AllocationBreakdown::default();
    };
    let get = |key: &str| allocation.get(key).map(number_of).unwrap_or(0.0);
    AllocationBreakdown {
        equities: get("equities"),
        defensive: get("defensive"),
        cash: get("cash"),
    }
}

/// The first strategy result, in response order.
pub fn first_result(response: &RunResponse) -> Result<&StrategyResult> {
    response
        .results
        .values()
        .next()
        .ok_or_else(|| anyhow!("Stock picker response did not include any strategy result"))
}

/// Map the first strategy result of a run into a user-facing recommendation.
pub fn to_engine_result(response: &RunResponse) -> Result<EngineResult> {
    let result = first_result(response)?;

    Ok(EngineResult {
        strategy: Strategy::from_engine(&result.strategy),
        action: Action::from_engine(result.decision.as_deref()),
        amount: 0.0,
        allocation: map_allocation(result.allocation.as_ref()),
        confidence: result.confidence.unwrap_or(0.0),
        invalidated_if: Vec::new(),
        explanation_summary: format!(
            "Strategy request {} completed with {} shortlisted assets.",
            result.request_id,
            result.shortlist.len()
        ),
        triggered_rules: result
            .rule_trace
            .iter()
            .enumerate()
            .map(|(i, item)| map_rule(i, item))
            .collect(),
        recession_probability: None,
    })
}

/// All suggested stocks across shortlist buckets.
pub fn flatten_shortlist(result: &StrategyResult) -> Vec<SuggestedStock> {
    result
        .shortlist
        .iter()
        .flat_map(|bucket| bucket.suggested_stocks.iter().cloned())
        .collect()
}
