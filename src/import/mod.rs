// src/import/mod.rs
//! Holdings import: pasted tables, CSV and XLSX broker exports into positions.
//!
//! Both front-ends only produce a [`RawTable`]; header detection, column
//! resolution and row validation are shared by [`validate_table`].

pub mod delimiter;
pub mod header;
pub mod raw_table;
pub mod row;
pub mod sheet;
pub mod text;
pub mod utils;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;
use tracing::{debug, info};

pub use delimiter::detect_delimiter;
pub use header::{locate_header, resolve_columns, HeaderMap};
pub use raw_table::RawTable;
pub use row::{parse_row, PreviewRow, RowError};

use crate::models::Position;

/// A failure that rejects the whole table, reported as a single row 0 entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TableFailure {
    #[error("No data found in file")]
    NoData,
    #[error("Could not detect ticker and quantity columns")]
    UndetectableColumns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidRow {
    /// 1-based line of the source table; 0 for whole-table failures.
    pub row_number: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid_rows: Vec<PreviewRow>,
    pub invalid_rows: Vec<InvalidRow>,
    pub total_imported: usize,
    pub total_skipped: usize,
}

impl ValidationResult {
    fn failed(failure: TableFailure) -> Self {
        Self {
            valid_rows: Vec::new(),
            invalid_rows: vec![InvalidRow {
                row_number: 0,
                error: failure.to_string(),
            }],
            total_imported: 0,
            total_skipped: 1,
        }
    }
}

/// Run header detection, column resolution and row parsing over a grid.
///
/// Blank-ticker rows are dropped without appearing in either list or total.
pub fn validate_table(table: &RawTable) -> ValidationResult {
    let (header_row, headers) = locate_header(table);
    let Some(columns) = resolve_columns(header_row, &headers) else {
        debug!(?headers, "ticker/quantity columns not found");
        return ValidationResult::failed(TableFailure::UndetectableColumns);
    };
    debug!(?columns, "columns resolved");

    let mut valid_rows = Vec::new();
    let mut invalid_rows = Vec::new();
    for (offset, cells) in table.rows.iter().skip(header_row + 1).enumerate() {
        let row_number = header_row + 2 + offset;
        let Some(parsed) = parse_row(cells, &columns) else {
            continue;
        };
        match &parsed.error {
            Some(error) => invalid_rows.push(InvalidRow {
                row_number,
                error: error.clone(),
            }),
            None => valid_rows.push(parsed),
        }
    }

    info!(
        imported = valid_rows.len(),
        skipped = invalid_rows.len(),
        "table validated"
    );
    ValidationResult {
        total_imported: valid_rows.len(),
        total_skipped: invalid_rows.len(),
        valid_rows,
        invalid_rows,
    }
}

/// Parse pasted text or CSV content. Empty input yields an empty result, not an error row.
#[tracing::instrument(level = "debug", skip(text), fields(bytes = text.len()))]
pub fn parse_table(text: &str) -> ValidationResult {
    let table = text::read_text_table(text);
    if table.is_empty() {
        return ValidationResult::default();
    }
    validate_table(&table)
}

pub fn parse_csv(content: &str) -> ValidationResult {
    parse_table(content)
}

/// Parse the first sheet of an XLSX workbook.
///
/// Unlike [`parse_table`], a missing or empty sheet is reported as a
/// "No data found in file" row.
#[tracing::instrument(level = "debug", skip(bytes), fields(bytes = bytes.len()))]
pub fn parse_xlsx(bytes: &[u8]) -> ValidationResult {
    match sheet::read_xlsx_table(bytes) {
        Some(table) => validate_table(&table),
        None => ValidationResult::failed(TableFailure::NoData),
    }
}

/// Read and parse an uploaded `.xlsx` or `.csv` file, chosen by extension.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ValidationResult> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let bytes = match extension.as_str() {
        "xlsx" | "csv" => {
            fs::read(path).with_context(|| format!("reading {}", path.display()))?
        }
        _ => bail!("unsupported file type: {}", path.display()),
    };

    info!(path = %path.display(), "importing holdings file");
    Ok(if extension == "xlsx" {
        parse_xlsx(&bytes)
    } else {
        parse_csv(&String::from_utf8_lossy(&bytes))
    })
}

/// Keep only rows that passed validation, as plain positions.
pub fn validate_positions(rows: &[PreviewRow]) -> Vec<Position> {
    rows.iter()
        .filter(|row| row.is_valid() && !row.ticker.is_empty())
        .map(|row| Position {
            ticker: row.ticker.clone(),
            quantity: row.quantity,
            avg_cost: row.avg_cost,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::sheet::fixtures::{workbook, Cell};
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_parse_table_mixed_rows() {
        let text = "Symbol,Quantity,Avg Cost\n\
                    AAPL,10,150.50\n\
                    MSFT,,\n\
                    ,10,\n\
                    GOOG,-5,\n\
                    TSLA,3,abc\n\
                    VTI,\"1,200\",\"210.10\"\n";
        let result = parse_table(text);

        assert_eq!(result.total_imported, 2);
        assert_eq!(result.total_skipped, 3);
        assert_eq!(result.valid_rows[0].ticker, "AAPL");
        assert_eq!(result.valid_rows[0].avg_cost, Some(150.50));
        assert_eq!(result.valid_rows[1].ticker, "VTI");
        assert_eq!(result.valid_rows[1].quantity, 1200.0);
        assert_eq!(
            result.invalid_rows,
            vec![
                InvalidRow {
                    row_number: 3,
                    error: "Missing quantity".into()
                },
                InvalidRow {
                    row_number: 5,
                    error: "Invalid quantity".into()
                },
                InvalidRow {
                    row_number: 6,
                    error: "Invalid average cost format".into()
                },
            ]
        );
    }

    #[test]
    fn test_row_numbers_account_for_title_block() {
        let text = "Brokerage export\n\nTicker\tShares\nAAPL\t0\n";
        let result = parse_table(text);
        // empty line is skipped, header sits at grid index 1
        assert_eq!(result.invalid_rows[0].row_number, 3);
    }

    #[test]
    fn test_totals_exclude_blank_tickers() {
        let text = "ticker;qty\nA;1\n;2\nB;x\n ;3\nC;4";
        let result = parse_table(text);
        let fed_rows = 5;
        let blank_tickers = 2;
        assert_eq!(
            result.total_imported + result.total_skipped,
            fed_rows - blank_tickers
        );
        assert_eq!(result.total_imported, result.valid_rows.len());
        assert_eq!(result.total_skipped, result.invalid_rows.len());
    }

    #[test]
    fn test_empty_text_is_silently_empty() {
        let result = parse_table("");
        assert_eq!(result, ValidationResult::default());
        assert_eq!(parse_csv("\n\n"), ValidationResult::default());
    }

    #[test]
    fn test_undetectable_columns() {
        let result = parse_table("Symbol,Price\nAAPL,150");
        assert!(result.valid_rows.is_empty());
        assert_eq!(result.total_imported, 0);
        assert_eq!(result.total_skipped, 1);
        assert_eq!(
            result.invalid_rows,
            vec![InvalidRow {
                row_number: 0,
                error: "Could not detect ticker and quantity columns".into()
            }]
        );
    }

    #[test]
    fn test_headerless_table_is_not_guessed() {
        let result = parse_table("AAPL,10\nMSFT,5");
        assert_eq!(result.total_skipped, 1);
        assert_eq!(result.invalid_rows[0].row_number, 0);
    }

    #[test]
    fn test_parse_xlsx() {
        let bytes = workbook(&[vec![
            vec![Cell::Text("Holdings report")],
            vec![
                Cell::Text("Symbol/CUSIP"),
                Cell::Text("Quantity"),
                Cell::Text("Purchase Price"),
            ],
            vec![Cell::Text("aapl"), Cell::Number(10.0), Cell::Number(150.5)],
            vec![Cell::Blank, Cell::Number(3.0), Cell::Blank],
            vec![Cell::Text("MSFT"), Cell::Number(-1.0), Cell::Blank],
        ]]);
        let result = parse_xlsx(&bytes);

        assert_eq!(result.total_imported, 1);
        assert_eq!(result.valid_rows[0].ticker, "AAPL");
        assert_eq!(result.valid_rows[0].quantity, 10.0);
        assert_eq!(result.valid_rows[0].avg_cost, Some(150.5));
        assert_eq!(
            result.invalid_rows,
            vec![InvalidRow {
                row_number: 5,
                error: "Invalid quantity".into()
            }]
        );
    }

    #[test]
    fn test_parse_xlsx_without_data() {
        let expected = ValidationResult {
            valid_rows: vec![],
            invalid_rows: vec![InvalidRow {
                row_number: 0,
                error: "No data found in file".into(),
            }],
            total_imported: 0,
            total_skipped: 1,
        };
        assert_eq!(parse_xlsx(&workbook(&[])), expected);
        assert_eq!(parse_xlsx(&workbook(&[vec![]])), expected);
    }

    #[test]
    fn test_parse_xlsx_undetectable_columns() {
        let bytes = workbook(&[vec![
            vec![Cell::Text("Name"), Cell::Text("Value")],
            vec![Cell::Text("Apple"), Cell::Number(1500.0)],
        ]]);
        let result = parse_xlsx(&bytes);
        assert_eq!(
            result.invalid_rows[0].error,
            "Could not detect ticker and quantity columns"
        );
    }

    #[test]
    fn test_parse_file_dispatches_on_extension() -> Result<()> {
        let mut csv_file = Builder::new().suffix(".csv").tempfile()?;
        csv_file.write_all(b"Ticker,Qty\nAAPL,10\n")?;
        let result = parse_file(csv_file.path())?;
        assert_eq!(result.total_imported, 1);

        let mut xlsx_file = Builder::new().suffix(".XLSX").tempfile()?;
        xlsx_file.write_all(&workbook(&[vec![
            vec![Cell::Text("Ticker"), Cell::Text("Units")],
            vec![Cell::Text("VTI"), Cell::Number(2.0)],
        ]]))?;
        let result = parse_file(xlsx_file.path())?;
        assert_eq!(result.valid_rows[0].ticker, "VTI");

        let txt_file = Builder::new().suffix(".txt").tempfile()?;
        assert!(parse_file(txt_file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_validate_positions_keeps_only_valid_rows() {
        let rows = vec![
            PreviewRow {
                ticker: "AAPL".into(),
                quantity: 10.0,
                avg_cost: Some(150.5),
                raw_row: Some(vec!["AAPL".into(), "10".into(), "150.5".into()]),
                error: None,
            },
            PreviewRow {
                ticker: "MSFT".into(),
                quantity: 0.0,
                avg_cost: None,
                raw_row: None,
                error: Some("Missing quantity".into()),
            },
            PreviewRow {
                ticker: "VTI".into(),
                quantity: 2.0,
                avg_cost: None,
                raw_row: None,
                error: None,
            },
        ];

        let positions = validate_positions(&rows);
        assert_eq!(
            positions,
            vec![
                Position {
                    ticker: "AAPL".into(),
                    quantity: 10.0,
                    avg_cost: Some(150.5)
                },
                Position {
                    ticker: "VTI".into(),
                    quantity: 2.0,
                    avg_cost: None
                },
            ]
        );

        let json = serde_json::to_value(&positions[0]).unwrap();
        assert!(json.get("error").is_none());
        assert!(json.get("raw_row").is_none());
    }
}
