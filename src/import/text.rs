use csv::ReaderBuilder;
use tracing::{trace, warn};

use super::delimiter::detect_delimiter;
use super::raw_table::RawTable;

/// Split pasted text or CSV content into a grid, skipping empty lines.
///
/// The delimiter is sniffed from the first lines. Quoted cells may contain
/// the delimiter. Rows may have differing lengths.
pub fn read_text_table(text: &str) -> RawTable {
    let delimiter = detect_delimiter(text);
    trace!(delimiter = ?(delimiter as char), "delimiter detected");

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        match result {
            Ok(record) => {
                if record.len() == 1 && record[0].is_empty() {
                    continue;
                }
                rows.push(record.iter().map(str::to_string).collect());
            }
            Err(err) => warn!(record = idx, error = %err, "skipping unreadable record"),
        }
    }

    RawTable::new(rows)
}
