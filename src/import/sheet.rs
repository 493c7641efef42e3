use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use tracing::{debug, warn};

use super::raw_table::RawTable;

/// Read the first worksheet of an XLSX workbook into a grid.
///
/// `None` when the bytes are not a readable workbook, the workbook has no
/// sheets, or the first sheet has no rows. Blank rows inside the used range
/// are kept so row numbers line up with the spreadsheet. Cells keep their
/// literal text: empty cells become `""` and whole floats render without `.0`.
pub fn read_xlsx_table(bytes: &[u8]) -> Option<RawTable> {
    let mut workbook: Xlsx<_> = match open_workbook_from_rs(Cursor::new(bytes)) {
        Ok(wb) => wb,
        Err(err) => {
            warn!(error = %err, "could not open workbook");
            return None;
        }
    };

    let range = match workbook.worksheet_range_at(0)? {
        Ok(range) => range,
        Err(err) => {
            warn!(error = %err, "could not read first worksheet");
            return None;
        }
    };

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(Data::to_string).collect())
        .collect();
    debug!(rows = rows.len(), "read first worksheet");

    if rows.is_empty() {
        return None;
    }
    Some(RawTable::new(rows))
}
