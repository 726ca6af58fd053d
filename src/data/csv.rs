//! CSV parsing for numeric datasets.
//!
//! Supported format:
//! - UTF-8, comma-separated
//! - Optional header row (auto-detected: first row is a header if it contains
//!   any non-numeric, non-empty cell)
//! - Double-quoted fields with embedded commas
//! - The last `target_columns` columns of each row form the target vector

use crate::error::{NnError, Result};

/// Parses CSV text into `(inputs, targets)`.
pub fn parse_csv(text: &str, target_columns: usize) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>)> {
    if target_columns == 0 {
        return Err(NnError::Csv("at least one target column is required".into()));
    }

    let mut lines = text.lines().peekable();

    // Auto-detect header: skip first line if any cell is non-numeric.
    if let Some(first) = lines.peek() {
        if is_header(first) {
            lines.next();
        }
    }

    let mut inputs: Vec<Vec<f64>> = Vec::new();
    let mut targets: Vec<Vec<f64>> = Vec::new();

    for (row_idx, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let cells = parse_csv_row(line);
        if cells.len() < target_columns + 1 {
            return Err(NnError::Csv(format!(
                "row {}: expected at least {} columns, got {}",
                row_idx + 1,
                target_columns + 1,
                cells.len()
            )));
        }
        let split = cells.len() - target_columns;
        inputs.push(parse_floats(&cells[..split], row_idx + 1)?);
        targets.push(parse_floats(&cells[split..], row_idx + 1)?);
    }

    if inputs.is_empty() {
        return Err(NnError::Csv("CSV contains no data rows".into()));
    }

    let n_feats = inputs[0].len();
    if let Some((i, row)) = inputs.iter().enumerate().find(|(_, row)| row.len() != n_feats) {
        return Err(NnError::Csv(format!(
            "row {}: feature count {} does not match first row's {}",
            i + 1, row.len(), n_feats
        )));
    }

    Ok((inputs, targets))
}

/// Returns `true` if the row looks like a header (any cell non-numeric).
fn is_header(line: &str) -> bool {
    parse_csv_row(line).iter().any(|c| {
        let t = c.trim();
        !t.is_empty() && t.parse::<f64>().is_err()
    })
}

/// Splits a single CSV row, handling double-quoted fields.
pub(crate) fn parse_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                // Escaped quote inside quoted field.
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Quotes `field` when it holds a comma, a quote or a line break, doubling
/// any inner quotes.
pub(crate) fn quote_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn parse_floats(cells: &[String], row_num: usize) -> Result<Vec<f64>> {
    cells.iter()
        .map(|c| {
            c.trim().parse::<f64>().map_err(|_| {
                NnError::Csv(format!("row {row_num}: '{c}' is not a valid number"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_skipped_and_targets_split() {
        let text = "x1,x2,y\n1,2,3\n\"4\",5,6\n";
        let (inputs, targets) = parse_csv(text, 1).unwrap();
        assert_eq!(inputs, vec![vec![1.0, 2.0], vec![4.0, 5.0]]);
        assert_eq!(targets, vec![vec![3.0], vec![6.0]]);
    }

    #[test]
    fn bad_cell_reports_row() {
        let err = parse_csv("1,2\n3,x\n", 1).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }
}
