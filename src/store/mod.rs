// src/store/mod.rs
//! Repository for portfolios, positions, the last engine run and recommendations.

pub mod json_dir;

use anyhow::{anyhow, Result};
use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

pub use json_dir::JsonDirStore;

use crate::engine::RunResponse;
use crate::models::{Portfolio, Position, Recommendation};

/// Storage seam injected into the portfolio and history services.
pub trait PortfolioStore: Send + Sync {
    fn portfolio(&self, id: &str) -> Result<Option<Portfolio>>;
    /// Insert or replace by `portfolio.id`.
    fn put_portfolio(&self, portfolio: &Portfolio) -> Result<()>;

    /// Positions of a portfolio; empty when none were stored.
    fn positions(&self, portfolio_id: &str) -> Result<Vec<Position>>;
    fn put_positions(&self, portfolio_id: &str, positions: &[Position]) -> Result<()>;

    fn current_portfolio_id(&self) -> Result<Option<String>>;
    fn set_current_portfolio_id(&self, id: &str) -> Result<()>;

    fn last_run(&self) -> Result<Option<RunResponse>>;
    fn set_last_run(&self, run: &RunResponse) -> Result<()>;

    /// All recommendations, in insertion order.
    fn recommendations(&self) -> Result<Vec<Recommendation>>;
    fn push_recommendation(&self, recommendation: &Recommendation) -> Result<()>;
}

#[derive(Default)]
struct MemoryState {
    portfolios: Vec<Portfolio>,
    positions: HashMap<String, Vec<Position>>,
    current_portfolio_id: Option<String>,
    last_run: Option<RunResponse>,
    recommendations: Vec<Recommendation>,
}

/// Process-local store, used by tests and short-lived runs.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(|_| anyhow!("memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl PortfolioStore for MemoryStore {
    fn portfolio(&self, id: &str) -> Result<Option<Portfolio>> {
        Ok(self.read()?.portfolios.iter().find(|p| p.id == id).cloned())
    }

    fn put_portfolio(&self, portfolio: &Portfolio) -> Result<()> {
        let mut state = self.write()?;
        match state.portfolios.iter_mut().find(|p| p.id == portfolio.id) {
            Some(existing) => *existing = portfolio.clone(),
            None => state.portfolios.push(portfolio.clone()),
        }
        Ok(())
    }

    fn positions(&self, portfolio_id: &str) -> Result<Vec<Position>> {
        Ok(self
            .read()?
            .positions
            .get(portfolio_id)
            .cloned()
            .unwrap_or_default())
    }

    fn put_positions(&self, portfolio_id: &str, positions: &[Position]) -> Result<()> {
        self.write()?
            .positions
            .insert(portfolio_id.to_string(), positions.to_vec());
        Ok(())
    }

    fn current_portfolio_id(&self) -> Result<Option<String>> {
        Ok(self.read()?.current_portfolio_id.clone())
    }

    fn set_current_portfolio_id(&self, id: &str) -> Result<()> {
        self.write()?.current_portfolio_id = Some(id.to_string());
        Ok(())
    }

    fn last_run(&self) -> Result<Option<RunResponse>> {
        Ok(self.read()?.last_run.clone())
    }

    fn set_last_run(&self, run: &RunResponse) -> Result<()> {
        self.write()?.last_run = Some(run.clone());
        Ok(())
    }

    fn recommendations(&self) -> Result<Vec<Recommendation>> {
        Ok(self.read()?.recommendations.clone())
    }

    fn push_recommendation(&self, recommendation: &Recommendation) -> Result<()> {
        self.write()?.recommendations.push(recommendation.clone());
        Ok(())
    }
}
