use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::header::HeaderMap;
use super::utils::parse_amount;

/// Why a single data row was rejected. The messages are shown to users verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("Missing quantity")]
    MissingQuantity,
    #[error("Invalid quantity")]
    InvalidQuantity,
    #[error("Invalid average cost format")]
    InvalidAverageCost,
}

/// One candidate position parsed from a data row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewRow {
    pub ticker: String,
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_row: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PreviewRow {
    fn accepted(ticker: String, quantity: f64, avg_cost: Option<f64>, raw: &[String]) -> Self {
        Self {
            ticker,
            quantity,
            avg_cost,
            raw_row: Some(raw.to_vec()),
            error: None,
        }
    }

    fn rejected(ticker: String, quantity: f64, error: RowError, raw: &[String]) -> Self {
        Self {
            ticker,
            quantity,
            avg_cost: None,
            raw_row: Some(raw.to_vec()),
            error: Some(error.to_string()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Parse one data row against the resolved columns.
///
/// Returns `None` for a blank ticker: such rows are dropped without being
/// counted anywhere. Cells missing from short rows count as empty.
pub fn parse_row(cells: &[String], columns: &HeaderMap) -> Option<PreviewRow> {
    let cell = |idx: usize| cells.get(idx).map(|c| c.trim()).unwrap_or("");

    let ticker = cell(columns.ticker).to_uppercase();
    if ticker.is_empty() {
        return None;
    }

    let quantity_text = cell(columns.quantity);
    if quantity_text.is_empty() {
        return Some(PreviewRow::rejected(ticker, 0.0, RowError::MissingQuantity, cells));
    }

    let quantity = match parse_amount(quantity_text) {
        Some(q) if q > 0.0 => q,
        _ => {
            return Some(PreviewRow::rejected(ticker, 0.0, RowError::InvalidQuantity, cells));
        }
    };

    let avg_cost = match columns.cost.map(cell).filter(|c| !c.is_empty()) {
        None => None,
        Some(cost_text) => match parse_amount(cost_text) {
            Some(c) if c >= 0.0 => Some(c),
            // keeps the already-valid quantity for display
            _ => {
                return Some(PreviewRow::rejected(
                    ticker,
                    quantity,
                    RowError::InvalidAverageCost,
                    cells,
                ));
            }
        },
    };

    Some(PreviewRow::accepted(ticker, quantity, avg_cost, cells))
}
