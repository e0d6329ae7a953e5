use super::model::Table;
use crate::error::Result;

/// Outcome of cleaning one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned {
    pub table: Table,
    pub dropped: usize,
}

/// Drop every row with a missing value in any of `required`.
///
/// The column set is unchanged and surviving rows keep their source index,
/// so applying this twice gives the same table as applying it once.
pub fn drop_incomplete(table: &Table, required: &[&str]) -> Result<Cleaned> {
    let indices = required
        .iter()
        .map(|c| table.require_column(c))
        .collect::<Result<Vec<_>>>()?;

    let rows: Vec<_> = table
        .rows
        .iter()
        .filter(|row| indices.iter().all(|&i| !row.cells[i].is_missing()))
        .cloned()
        .collect();

    let dropped = table.len() - rows.len();
    if dropped > 0 {
        log::debug!("Dropped {dropped} incomplete rows from {}", table.name);
    }

    Ok(Cleaned {
        table: table.with_rows(table.name.clone(), rows),
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;
    use crate::error::DashboardError;

    fn sample() -> Table {
        Table::from_cells(
            "state_comparison",
            vec!["state".into(), "total_estate_area".into(), "note".into()],
            vec![
                vec!["Edo".into(), CellValue::Float(100.0), CellValue::Null],
                vec![CellValue::Null, CellValue::Float(50.0), "x".into()],
                vec!["Ondo".into(), CellValue::Float(f64::NAN), "y".into()],
                vec!["Delta".into(), CellValue::Float(80.0), "z".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn drops_rows_missing_required_values_only() {
        let cleaned = drop_incomplete(&sample(), &["state", "total_estate_area"]).unwrap();
        assert_eq!(cleaned.dropped, 2);
        let kept: Vec<usize> = cleaned.table.rows.iter().map(|r| r.source_index).collect();
        assert_eq!(kept, vec![0, 3]);
        assert_eq!(cleaned.table.columns.len(), 3);
    }

    #[test]
    fn cleaning_is_idempotent() {
        let required = ["state", "total_estate_area"];
        let once = drop_incomplete(&sample(), &required).unwrap();
        let twice = drop_incomplete(&once.table, &required).unwrap();
        assert_eq!(twice.table, once.table);
        assert_eq!(twice.dropped, 0);
    }

    #[test]
    fn unknown_required_column_is_an_error() {
        let err = drop_incomplete(&sample(), &["rainfall"]).unwrap_err();
        assert!(matches!(err, DashboardError::MissingColumn { .. }));
    }
}
