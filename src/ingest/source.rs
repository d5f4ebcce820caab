//! File readers for the two input formats spec.md §6 names: XLSX workbooks
//! (via `calamine`) and delimiter-sniffed CSV, latin-1 decoded.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{EngineError, EngineResult};
use crate::parse::transform_numeric_cell;

use super::row::Row;

/// One sheet's worth of rows, header row already consumed into column names.
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

/// Reads every sheet of an XLSX workbook into [`Sheet`]s, applying the
/// numeric column transform cell-by-cell (spec.md §4.1 "Column-value
/// transformation").
pub fn read_xlsx(path: &Path) -> EngineResult<Vec<Sheet>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| EngineError::Spreadsheet(e.to_string()))?;
    let sheet_names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| EngineError::Spreadsheet(format!("{name}: {e}")))?;
        let mut iter = range.rows();
        let Some(header_row) = iter.next() else { continue };
        let headers: Vec<String> = header_row.iter().map(cell_to_string).collect();

        let rows = iter
            .map(|data_row| {
                let cells = headers
                    .iter()
                    .zip(data_row.iter())
                    .map(|(header, cell)| (header.clone(), transform_numeric_cell(&cell_to_string(cell))))
                    .collect();
                Row::new(cells)
            })
            .collect();

        sheets.push(Sheet { name, rows });
    }
    Ok(sheets)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(d) => d.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
    }
}

/// Sniffs the delimiter from the first few KB of a CSV file by counting
/// candidate separators on its first non-empty line, then reads it as
/// latin-1 (spec.md §6 "Encoding assumed latin-1 for CSV").
pub fn read_csv(path: &Path) -> EngineResult<Sheet> {
    let bytes = std::fs::read(path)?;
    let text = latin1_to_utf8(&bytes);
    let delimiter = sniff_delimiter(&text);

    let mut reader = csv::ReaderBuilder::new().delimiter(delimiter).has_headers(true).from_reader(text.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.clone(), transform_numeric_cell(value)))
            .collect();
        rows.push(Row::new(cells));
    }

    let name = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    Ok(Sheet { name, rows })
}

/// Every byte in Latin-1 (ISO-8859-1) maps directly onto the Unicode code
/// point of the same value, so this never needs an external decoding table.
fn latin1_to_utf8(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    const CANDIDATES: [u8; 3] = [b',', b';', b'\t'];
    CANDIDATES
        .into_iter()
        .max_by_key(|&c| first_line.bytes().filter(|&b| b == c).count())
        .unwrap_or(b',')
}
