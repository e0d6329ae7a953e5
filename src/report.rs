//! Plain-text rendering of a dashboard view for `--report`.

use std::fmt::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

use crate::data::model::{CellValue, ColumnType, Table};
use crate::pipeline::{DashboardView, PreparedData};

/// Convert a table into a single Arrow record batch.
pub fn to_record_batch(table: &Table) -> Result<RecordBatch> {
    let fields: Vec<Field> = table
        .columns
        .iter()
        .zip(&table.column_types)
        .map(|(name, ty)| {
            let dtype = match ty {
                ColumnType::Integer => DataType::Int64,
                ColumnType::Float => DataType::Float64,
                ColumnType::String => DataType::Utf8,
            };
            Field::new(name, dtype, true)
        })
        .collect();

    let arrays: Vec<ArrayRef> = table
        .column_types
        .iter()
        .enumerate()
        .map(|(c, ty)| -> ArrayRef {
            let cells = table.rows.iter().map(|r| &r.cells[c]);
            match ty {
                ColumnType::Integer => Arc::new(Int64Array::from(
                    cells
                        .map(|v| match v {
                            CellValue::Integer(i) => Some(*i),
                            _ => None,
                        })
                        .collect::<Vec<_>>(),
                )),
                ColumnType::Float => {
                    Arc::new(Float64Array::from(cells.map(|v| v.as_f64()).collect::<Vec<_>>()))
                }
                ColumnType::String => Arc::new(StringArray::from(
                    cells.map(|v| v.as_str().map(str::to_string)).collect::<Vec<_>>(),
                )),
            }
        })
        .collect();

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
        .with_context(|| format!("building record batch for {}", table.name))
}

fn pretty_table(table: &Table) -> Result<String> {
    let batch = to_record_batch(table)?;
    Ok(pretty_format_batches(&[batch])
        .context("formatting table")?
        .to_string())
}

/// The selected rows, the ROI and break-even lines, and any metric issues.
pub fn render(prepared: &PreparedData, view: &DashboardView) -> Result<String> {
    let mut out = String::new();
    let sections = [
        ("State", &view.state_rows),
        ("Production", &view.production_rows),
        ("Company", &view.company_rows),
    ];
    for (title, table) in sections {
        writeln!(out, "{title}: {}", table.name)?;
        writeln!(out, "{}", pretty_table(table)?)?;
    }
    writeln!(out, "{}", view.state_cost_text())?;
    writeln!(out, "{}", view.roi_text())?;
    writeln!(out, "{}", view.break_even_text())?;

    if !prepared.issues.is_empty() {
        writeln!(out)?;
        writeln!(out, "Undefined metrics:")?;
        for issue in &prepared.issues {
            writeln!(
                out,
                "  {} (source row {}): {}",
                issue.company, issue.source_row, issue.error
            )?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use crate::data::metrics::EstateAlignment;
    use crate::pipeline::fixtures::MemorySource;
    use crate::pipeline::{Selection, run};

    #[test]
    fn record_batch_keeps_nulls_and_types() {
        let table = crate::pipeline::fixtures::csv_table("t", "a,b,c\n1,2.5,x\n,,\n").unwrap();
        let batch = to_record_batch(&table).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Int64);
        assert_eq!(batch.schema().field(2).data_type(), &DataType::Utf8);
        assert_eq!(batch.column(1).null_count(), 1);
    }

    #[test]
    fn report_contains_scalar_lines_and_issues() {
        let source = MemorySource::new();
        let selection = Selection {
            company: Some("Okomu".into()),
            ..Selection::default()
        };
        let (prepared, view) = run(&source, &EstateAlignment::SourceRow, selection).unwrap();
        let text = render(&prepared, &view).unwrap();
        assert!(text.contains("Cost per Hectare for Edo: 1200.00"));
        assert!(text.contains("ROI for Okomu: 10.00%"));
        assert!(text.contains("Break-even Point for Okomu: 150.00 hectares"));
        assert!(text.contains("Undefined metrics:"));
        assert!(text.contains("Presco"));
        assert!(text.contains("Edo"));
    }

    #[test]
    fn report_shows_not_found_for_stale_state() {
        let source = MemorySource::new();
        let selection = Selection {
            state: Some("Ondo".into()),
            ..Selection::default()
        };
        let (prepared, view) = run(&source, &EstateAlignment::SourceRow, selection).unwrap();
        let text = render(&prepared, &view).unwrap();
        assert!(text.contains("Cost per Hectare for Ondo: no data for this selection"));
    }
}
