// src/portfolio.rs
//! Portfolio lifecycle and recommendation history over an injected store.

use anyhow::{anyhow, Result};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::models::{EngineResult, Portfolio, PortfolioSnapshot, Position, Recommendation};
use crate::store::PortfolioStore;

/// Fields to change in [`update_portfolio`]; `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct PortfolioUpdate {
    pub cash_amount: Option<f64>,
    pub monthly_contribution: Option<f64>,
    pub risk_tolerance: Option<u8>,
    pub positions: Option<Vec<Position>>,
}

/// Create a portfolio with its positions and make it the current one.
pub fn create_portfolio<S: PortfolioStore + ?Sized>(
    store: &S,
    cash_amount: f64,
    monthly_contribution: f64,
    risk_tolerance: u8,
    positions: &[Position],
) -> Result<Portfolio> {
    let now = Utc::now();
    let portfolio = Portfolio {
        id: Uuid::new_v4().to_string(),
        user_id: None,
        cash_amount,
        monthly_contribution,
        risk_tolerance,
        created_at: now,
        updated_at: now,
    };

    store.put_portfolio(&portfolio)?;
    store.put_positions(&portfolio.id, positions)?;
    store.set_current_portfolio_id(&portfolio.id)?;
    info!(id = %portfolio.id, positions = positions.len(), "portfolio created");
    Ok(portfolio)
}

pub fn update_portfolio<S: PortfolioStore + ?Sized>(
    store: &S,
    id: &str,
    update: PortfolioUpdate,
) -> Result<Portfolio> {
    let current = store
        .portfolio(id)?
        .ok_or_else(|| anyhow!("Portfolio not found"))?;

    let updated = Portfolio {
        cash_amount: update.cash_amount.unwrap_or(current.cash_amount),
        monthly_contribution: update
            .monthly_contribution
            .unwrap_or(current.monthly_contribution),
        risk_tolerance: update.risk_tolerance.unwrap_or(current.risk_tolerance),
        updated_at: Utc::now(),
        ..current
    };
    store.put_portfolio(&updated)?;

    if let Some(positions) = update.positions {
        store.put_positions(id, &positions)?;
    }
    Ok(updated)
}

pub fn portfolio_snapshot<S: PortfolioStore + ?Sized>(
    store: &S,
    id: &str,
) -> Result<PortfolioSnapshot> {
    let portfolio = store
        .portfolio(id)?
        .ok_or_else(|| anyhow!("Portfolio not found"))?;
    Ok(PortfolioSnapshot {
        cash_amount: portfolio.cash_amount,
        monthly_contribution: portfolio.monthly_contribution,
        risk_tolerance: portfolio.risk_tolerance,
        positions: store.positions(id)?,
    })
}

pub fn save_recommendation<S: PortfolioStore + ?Sized>(
    store: &S,
    portfolio_id: &str,
    result: &EngineResult,
) -> Result<Recommendation> {
    let recommendation = Recommendation {
        id: Uuid::new_v4().to_string(),
        portfolio_id: portfolio_id.to_string(),
        strategy: result.strategy,
        action: result.action,
        amount: result.amount,
        allocation: result.allocation,
        confidence: result.confidence,
        recession_probability: result.recession_probability,
        explanation_summary: result.explanation_summary.clone(),
        triggered_rules: result.triggered_rules.clone(),
        invalidated_if: result.invalidated_if.clone(),
        created_at: Utc::now(),
    };
    store.push_recommendation(&recommendation)?;
    Ok(recommendation)
}

/// Recommendations for a portfolio, newest first.
pub fn recommendations_for<S: PortfolioStore + ?Sized>(
    store: &S,
    portfolio_id: &str,
) -> Result<Vec<Recommendation>> {
    let mut recs: Vec<Recommendation> = store
        .recommendations()?
        .into_iter()
        .filter(|r| r.portfolio_id == portfolio_id)
        .collect();
    recs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(recs)
}

pub fn recommendation<S: PortfolioStore + ?Sized>(
    store: &S,
    id: &str,
) -> Result<Option<Recommendation>> {
    Ok(store.recommendations()?.into_iter().find(|r| r.id == id))
}
