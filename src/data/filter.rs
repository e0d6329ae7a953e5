use std::collections::HashSet;

use super::model::{CellValue, Table};
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Selector filtering
// ---------------------------------------------------------------------------

/// Rows whose `column` equals `target` exactly. No match yields an empty
/// table, named after the selection that produced it.
pub fn filter_eq(table: &Table, column: &str, target: &CellValue) -> Result<Table> {
    let idx = table.require_column(column)?;
    let rows = table
        .rows
        .iter()
        .filter(|row| row.cells[idx].matches(target))
        .cloned()
        .collect();
    let name = format!("{}[{} = {}]", table.name, column, target.to_text());
    Ok(table.with_rows(name, rows))
}

/// Distinct present values of `column` in first-appearance order, used to
/// populate selection controls.
pub fn distinct_values(table: &Table, column: &str) -> Result<Vec<CellValue>> {
    let mut seen = HashSet::new();
    Ok(table
        .column_values(column)?
        .into_iter()
        .filter(|v| !v.is_missing())
        .filter(|v| seen.insert((*v).clone()))
        .cloned()
        .collect())
}

// ---------------------------------------------------------------------------
// Scalar extraction
// ---------------------------------------------------------------------------

/// The value of `column` in the first row of a filtered table.
pub fn scalar<'a>(table: &'a Table, column: &str) -> Result<&'a CellValue> {
    let idx = table.require_column(column)?;
    table
        .rows
        .first()
        .map(|row| &row.cells[idx])
        .ok_or_else(|| DashboardError::NotFound {
            table: table.name.clone(),
            column: column.to_string(),
        })
}

/// Numeric form of [`scalar`]. A NaN sentinel is returned as is.
pub fn scalar_f64(table: &Table, column: &str) -> Result<f64> {
    let value = scalar(table, column)?;
    value.as_f64().ok_or_else(|| DashboardError::NotNumeric {
        table: table.name.clone(),
        column: column.to_string(),
        value: value.to_text(),
    })
}
