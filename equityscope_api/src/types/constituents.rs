//! Constituent list parsing. The lists are plain CSV files with a header row.

use crate::Error;

/// Reads the `column` cells of a constituent CSV, in file order.
///
/// Cells are trimmed and empty cells skipped. A missing column is an error.
pub fn parse_symbols(csv_text: &str, column: &str) -> Result<Vec<String>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| Error::Csv(format!("failed to read header: {}", e)))?
        .clone();
    let idx = headers
        .iter()
        .position(|h| h.trim().trim_start_matches('\u{feff}') == column)
        .ok_or_else(|| Error::Csv(format!("missing column '{}'", column)))?;

    let mut symbols = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::Csv(format!("malformed row: {}", e)))?;
        if let Some(cell) = record.get(idx) {
            let cell = cell.trim();
            if !cell.is_empty() {
                symbols.push(cell.to_string());
            }
        }
    }
    Ok(symbols)
}
