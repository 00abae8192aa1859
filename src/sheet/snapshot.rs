//! Point-in-time copy of the results spreadsheet.

use std::collections::HashMap;

/// A snapshot of the spreadsheet: one header row plus data rows, in
/// spreadsheet order.
///
/// The row count deliberately excludes the header, matching how the external
/// workflow counts appended records. Rows shorter than the header are padded
/// with empty cells so every record maps each column name to a value (the
/// spreadsheet API omits trailing empty cells).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetSnapshot {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SheetSnapshot {
    /// An empty snapshot: no headers, no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a snapshot from a header row and data rows.
    pub fn new(headers: Vec<String>, mut rows: Vec<Vec<String>>) -> Self {
        for row in &mut rows {
            while row.len() < headers.len() {
                row.push(String::new());
            }
        }
        SheetSnapshot { headers, rows }
    }

    /// Number of data rows (the header is not counted).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The column names, in sheet order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The data rows, in sheet order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Returns row `index` as a column-name-to-value mapping.
    ///
    /// Cells beyond the header width are not part of the record view; they
    /// still appear in [`SheetSnapshot::to_csv`].
    pub fn record(&self, index: usize) -> Option<HashMap<&str, &str>> {
        let row = self.rows.get(index)?;
        Some(
            self.headers
                .iter()
                .zip(row)
                .map(|(h, v)| (h.as_str(), v.as_str()))
                .collect(),
        )
    }

    /// Serializes the snapshot (header row included) as RFC-4180 CSV.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        if !self.headers.is_empty() {
            write_csv_row(&mut out, &self.headers);
        }
        for row in &self.rows {
            write_csv_row(&mut out, row);
        }
        out
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Appends one CSV row, quoting fields that need it.
fn write_csv_row(out: &mut String, row: &[String]) {
    let mut first = true;
    for cell in row {
        if !first {
            out.push(',');
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push_str("\r\n");
}
