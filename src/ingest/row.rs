//! A single ingested row: a plain ordered list of `(header, raw value)`
//! pairs, the same shape both the CSV and XLSX readers in `source` produce
//! (spec.md §6 "Column headers are free text; no fixed schema").

#[derive(Debug, Clone, Default)]
pub struct Row {
    pub cells: Vec<(String, String)>,
}

impl Row {
    pub fn new(cells: Vec<(String, String)>) -> Self {
        Row { cells }
    }

    /// Raw value of the column named by `mapping.get(field)`, or empty string
    /// if the mapping has no column for that semantic field or the cell is
    /// blank.
    pub fn get_mapped(&self, column_name: Option<&str>) -> String {
        let Some(column_name) = column_name else { return String::new() };
        self.cells
            .iter()
            .find(|(header, _)| header == column_name)
            .map(|(_, value)| value.trim().to_string())
            .unwrap_or_default()
    }
}
