use tracing::debug;

use super::raw_table::RawTable;
use super::utils::normalize_header;

/// Header cells containing any of these name the ticker column.
pub const TICKER_SYNONYMS: &[&str] = &["ticker", "symbol", "symbol/cusip", "instrument"];
/// Header cells containing any of these name the quantity column.
pub const QUANTITY_SYNONYMS: &[&str] = &["quantity", "qty", "shares", "units"];
/// Header cells containing any of these name the average cost column.
pub const COST_SYNONYMS: &[&str] = &[
    "entry price",
    "avg cost",
    "average cost",
    "purchase price",
    "entry",
    "cost",
];

/// Broker exports often carry a title block above the real header.
const HEADER_SCAN_ROWS: usize = 5;

/// Where the header sits and which columns carry the fields we import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMap {
    pub header_row: usize,
    pub ticker: usize,
    pub quantity: usize,
    pub cost: Option<usize>,
}

fn matches_any(cell: &str, synonyms: &[&str]) -> bool {
    synonyms.iter().any(|s| cell.contains(s))
}

fn find_column(headers: &[String], synonyms: &[&str]) -> Option<usize> {
    headers.iter().position(|h| matches_any(h, synonyms))
}

/// Find the header row among the first few rows of `table`.
///
/// A row qualifies when one cell looks like a ticker header and one looks
/// like a quantity header (substring match on normalized text). If nothing
/// qualifies, row 0 is returned, which may misparse headerless tables.
/// Returns the row index and its normalized cells.
pub fn locate_header(table: &RawTable) -> (usize, Vec<String>) {
    for (idx, row) in table.rows.iter().take(HEADER_SCAN_ROWS).enumerate() {
        let normalized: Vec<String> = row.iter().map(|c| normalize_header(c)).collect();
        let has_ticker = normalized.iter().any(|h| matches_any(h, TICKER_SYNONYMS));
        let has_quantity = normalized.iter().any(|h| matches_any(h, QUANTITY_SYNONYMS));
        if has_ticker && has_quantity {
            debug!(row = idx, "header row located");
            return (idx, normalized);
        }
    }

    debug!("no header-like row found, falling back to row 0");
    let fallback = table
        .rows
        .first()
        .map(|row| row.iter().map(|c| normalize_header(c)).collect())
        .unwrap_or_default();
    (0, fallback)
}

/// Resolve the ticker, quantity and cost columns of a normalized header row.
///
/// Each field takes the first column containing one of its synonyms; one
/// column may satisfy several fields. `None` when ticker or quantity is missing.
pub fn resolve_columns(header_row: usize, headers: &[String]) -> Option<HeaderMap> {
    let ticker = find_column(headers, TICKER_SYNONYMS)?;
    let quantity = find_column(headers, QUANTITY_SYNONYMS)?;
    Some(HeaderMap {
        header_row,
        ticker,
        quantity,
        cost: find_column(headers, COST_SYNONYMS),
    })
}
