use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::{CellValue, ColumnType, Table};
use crate::error::{DashboardError, Result};

pub const REVENUE: &str = "Revenue";
pub const COST_OF_REVENUE: &str = "Cost of revenue";
pub const PROFIT_FOR_YEAR: &str = "Profit for the year";
pub const NET_ASSETS: &str = "Net assets";
pub const TOTAL_ESTATE_AREA: &str = "total_estate_area";

// ---------------------------------------------------------------------------
// Derived metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedMetric {
    ProfitPerHectare,
    ProfitMargin,
    Roi,
    BreakEvenPoint,
}

impl DerivedMetric {
    pub const ALL: [DerivedMetric; 4] = [
        DerivedMetric::ProfitPerHectare,
        DerivedMetric::ProfitMargin,
        DerivedMetric::Roi,
        DerivedMetric::BreakEvenPoint,
    ];

    /// Column the metric is attached under.
    pub fn column(self) -> &'static str {
        match self {
            DerivedMetric::ProfitPerHectare => "Profit per Hectare",
            DerivedMetric::ProfitMargin => "Profit Margin",
            DerivedMetric::Roi => "ROI",
            DerivedMetric::BreakEvenPoint => "Break-even Point",
        }
    }
}

/// How a company row finds the total estate area it is divided by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EstateAlignment {
    /// Pair the company row with the state row from the same source row.
    SourceRow,
    /// Join each company to a named state row.
    ByState {
        #[serde(default)]
        company_states: BTreeMap<String, String>,
    },
}

impl Default for EstateAlignment {
    fn default() -> Self {
        EstateAlignment::SourceRow
    }
}

/// The financial inputs of one company row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompanyInputs {
    pub revenue: f64,
    pub cost_of_revenue: f64,
    pub profit_for_year: f64,
    pub net_assets: f64,
}

/// Derived values for one row. Undefined metrics hold NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompanyMetrics {
    pub profit_per_hectare: f64,
    pub profit_margin: f64,
    pub roi: f64,
    pub break_even_point: f64,
}

impl CompanyMetrics {
    pub fn get(&self, metric: DerivedMetric) -> f64 {
        match metric {
            DerivedMetric::ProfitPerHectare => self.profit_per_hectare,
            DerivedMetric::ProfitMargin => self.profit_margin,
            DerivedMetric::Roi => self.roi,
            DerivedMetric::BreakEvenPoint => self.break_even_point,
        }
    }
}

/// A metric that could not be computed for one company row.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricIssue {
    pub source_row: usize,
    pub company: String,
    pub metric: DerivedMetric,
    pub error: DashboardError,
}

/// The company table with derived columns attached, plus every row-level
/// problem met on the way.
#[derive(Debug, Clone)]
pub struct Derivation {
    pub company: Table,
    pub issues: Vec<MetricIssue>,
}

fn checked_ratio(
    numerator: f64,
    denominator: f64,
    metric: DerivedMetric,
    denominator_name: &'static str,
) -> Result<f64> {
    if denominator == 0.0 || !denominator.is_finite() {
        return Err(DashboardError::DivisionUndefined {
            metric: metric.column(),
            denominator: denominator_name,
        });
    }
    Ok(numerator / denominator)
}

/// Compute the four metrics for one row. Each failure leaves NaN in place
/// and is returned alongside; the other metrics are still computed.
pub fn derive_row(
    inputs: CompanyInputs,
    estate_area: Result<f64>,
) -> (CompanyMetrics, Vec<(DerivedMetric, DashboardError)>) {
    let mut issues = Vec::new();
    let mut record = |metric: DerivedMetric, value: Result<f64>| match value {
        Ok(v) => v,
        Err(e) => {
            issues.push((metric, e));
            f64::NAN
        }
    };

    let profit_per_hectare = record(
        DerivedMetric::ProfitPerHectare,
        estate_area.and_then(|area| {
            checked_ratio(
                inputs.revenue - inputs.cost_of_revenue,
                area,
                DerivedMetric::ProfitPerHectare,
                TOTAL_ESTATE_AREA,
            )
        }),
    );
    let profit_margin = record(
        DerivedMetric::ProfitMargin,
        checked_ratio(
            inputs.profit_for_year,
            inputs.revenue,
            DerivedMetric::ProfitMargin,
            REVENUE,
        )
        .map(|r| r * 100.0),
    );
    let roi = record(
        DerivedMetric::Roi,
        checked_ratio(
            inputs.profit_for_year,
            inputs.net_assets,
            DerivedMetric::Roi,
            NET_ASSETS,
        )
        .map(|r| r * 100.0),
    );
    let break_even_point = record(
        DerivedMetric::BreakEvenPoint,
        checked_ratio(
            inputs.cost_of_revenue,
            profit_per_hectare,
            DerivedMetric::BreakEvenPoint,
            DerivedMetric::ProfitPerHectare.column(),
        ),
    );

    (
        CompanyMetrics {
            profit_per_hectare,
            profit_margin,
            roi,
            break_even_point,
        },
        issues,
    )
}

fn numeric(table: &Table, row: usize, idx: usize) -> Result<f64> {
    let cell = &table.rows[row].cells[idx];
    cell.as_f64().ok_or_else(|| DashboardError::NotNumeric {
        table: table.name.clone(),
        column: table.columns[idx].clone(),
        value: cell.to_text(),
    })
}

/// Look up the estate area paired with a company row.
fn estate_area(
    state: &Table,
    alignment: &EstateAlignment,
    source_row: usize,
    company: &str,
) -> Result<f64> {
    let area_idx = state.require_column(TOTAL_ESTATE_AREA)?;
    let unavailable = |reason: String| DashboardError::EstateAreaUnavailable {
        company: company.to_string(),
        reason,
    };

    let row = match alignment {
        EstateAlignment::SourceRow => state
            .rows
            .iter()
            .find(|r| r.source_index == source_row)
            .ok_or_else(|| unavailable(format!("no state row at source row {source_row}")))?,
        EstateAlignment::ByState { company_states } => {
            let state_name = company_states
                .get(company)
                .ok_or_else(|| unavailable("no state mapped for this company".to_string()))?;
            let state_idx = state.require_column("state")?;
            let target = CellValue::from(state_name.as_str());
            state
                .rows
                .iter()
                .find(|r| r.cells[state_idx].matches(&target))
                .ok_or_else(|| unavailable(format!("state '{state_name}' not found")))?
        }
    };

    row.cells[area_idx].as_f64().ok_or_else(|| DashboardError::NotNumeric {
        table: state.name.clone(),
        column: TOTAL_ESTATE_AREA.to_string(),
        value: row.cells[area_idx].to_text(),
    })
}

/// Attach the four derived columns to the cleaned company table.
///
/// Row-level failures never abort the pass: the cell receives NaN and a
/// [`MetricIssue`] is recorded. Errors are only returned for schema
/// problems such as a missing input column.
pub fn derive_metrics(
    company: &Table,
    state: &Table,
    alignment: &EstateAlignment,
) -> Result<Derivation> {
    let metric_idx = company.require_column("metric")?;
    let revenue_idx = company.require_column(REVENUE)?;
    let cost_idx = company.require_column(COST_OF_REVENUE)?;
    let profit_idx = company.require_column(PROFIT_FOR_YEAR)?;
    let assets_idx = company.require_column(NET_ASSETS)?;
    state.require_column(TOTAL_ESTATE_AREA)?;

    let mut columns: Vec<Vec<CellValue>> = vec![Vec::with_capacity(company.len()); 4];
    let mut issues = Vec::new();

    for (i, row) in company.rows.iter().enumerate() {
        let inputs = CompanyInputs {
            revenue: numeric(company, i, revenue_idx)?,
            cost_of_revenue: numeric(company, i, cost_idx)?,
            profit_for_year: numeric(company, i, profit_idx)?,
            net_assets: numeric(company, i, assets_idx)?,
        };
        let name = row.cells[metric_idx].to_text();
        let area = estate_area(state, alignment, row.source_index, &name);

        let (metrics, row_issues) = derive_row(inputs, area);
        for (metric, error) in row_issues {
            log::warn!("{} (company '{name}', source row {})", error, row.source_index);
            issues.push(MetricIssue {
                source_row: row.source_index,
                company: name.clone(),
                metric,
                error,
            });
        }
        for (column, metric) in columns.iter_mut().zip(DerivedMetric::ALL) {
            column.push(CellValue::Float(metrics.get(metric)));
        }
    }

    let mut derived = company.clone();
    for (values, metric) in columns.into_iter().zip(DerivedMetric::ALL) {
        derived.push_column(metric.column(), ColumnType::Float, values);
    }

    Ok(Derivation {
        company: derived,
        issues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(rows: Vec<(&str, f64, f64, f64, f64)>) -> Table {
        Table::from_cells(
            "company_comparison",
            vec![
                "metric".into(),
                REVENUE.into(),
                COST_OF_REVENUE.into(),
                PROFIT_FOR_YEAR.into(),
                NET_ASSETS.into(),
            ],
            rows.into_iter()
                .map(|(m, r, c, p, n)| vec![m.into(), r.into(), c.into(), p.into(), n.into()])
                .collect(),
        )
        .unwrap()
    }

    fn state(rows: Vec<(&str, f64)>) -> Table {
        Table::from_cells(
            "state_comparison",
            vec!["state".into(), TOTAL_ESTATE_AREA.into()],
            rows.into_iter()
                .map(|(s, a)| vec![s.into(), a.into()])
                .collect(),
        )
        .unwrap()
    }

    fn metric_value(table: &Table, row: usize, metric: DerivedMetric) -> f64 {
        let idx = table.column_index(metric.column()).unwrap();
        table.rows[row].cells[idx].as_f64().unwrap()
    }

    #[test]
    fn okomu_example_metrics() {
        let derivation = derive_metrics(
            &company(vec![("Okomu", 1000.0, 600.0, 200.0, 2000.0)]),
            &state(vec![("Edo", 100.0)]),
            &EstateAlignment::SourceRow,
        )
        .unwrap();
        let t = &derivation.company;
        assert!(derivation.issues.is_empty());
        assert_eq!(metric_value(t, 0, DerivedMetric::ProfitPerHectare), 4.0);
        assert_eq!(metric_value(t, 0, DerivedMetric::ProfitMargin), 20.0);
        assert_eq!(metric_value(t, 0, DerivedMetric::Roi), 10.0);
        assert_eq!(metric_value(t, 0, DerivedMetric::BreakEvenPoint), 150.0);
    }

    #[test]
    fn margin_and_roi_follow_their_formulas() {
        let rows = vec![
            ("A", 1234.5, 100.0, 321.0, 999.0),
            ("B", 87.0, 10.0, -13.0, 4.5),
            ("C", 3.0, 1.0, 7.0, 0.25),
        ];
        let derivation = derive_metrics(
            &company(rows.clone()),
            &state(vec![("X", 1.0), ("Y", 2.0), ("Z", 3.0)]),
            &EstateAlignment::SourceRow,
        )
        .unwrap();
        for (i, (_, revenue, _, profit, assets)) in rows.into_iter().enumerate() {
            let t = &derivation.company;
            assert_eq!(
                metric_value(t, i, DerivedMetric::ProfitMargin),
                profit / revenue * 100.0
            );
            assert_eq!(metric_value(t, i, DerivedMetric::Roi), profit / assets * 100.0);
        }
    }

    #[test]
    fn zero_revenue_flags_only_that_row() {
        let derivation = derive_metrics(
            &company(vec![
                ("Okomu", 0.0, 600.0, 200.0, 2000.0),
                ("Presco", 1000.0, 600.0, 200.0, 2000.0),
            ]),
            &state(vec![("Edo", 100.0), ("Delta", 100.0)]),
            &EstateAlignment::SourceRow,
        )
        .unwrap();

        let margin_issue = derivation
            .issues
            .iter()
            .find(|i| i.metric == DerivedMetric::ProfitMargin)
            .unwrap();
        assert_eq!(margin_issue.company, "Okomu");
        assert_eq!(
            margin_issue.error,
            DashboardError::DivisionUndefined {
                metric: "Profit Margin",
                denominator: REVENUE,
            }
        );
        assert!(derivation.issues.iter().all(|i| i.source_row == 0));

        let t = &derivation.company;
        assert!(metric_value(t, 0, DerivedMetric::ProfitMargin).is_nan());
        assert_eq!(metric_value(t, 0, DerivedMetric::Roi), 10.0);
        assert_eq!(metric_value(t, 1, DerivedMetric::ProfitMargin), 20.0);
    }

    #[test]
    fn zero_profit_per_hectare_leaves_break_even_undefined() {
        let (metrics, issues) = derive_row(
            CompanyInputs {
                revenue: 600.0,
                cost_of_revenue: 600.0,
                profit_for_year: 0.0,
                net_assets: 0.0,
            },
            Ok(100.0),
        );
        assert_eq!(metrics.profit_per_hectare, 0.0);
        assert!(metrics.break_even_point.is_nan());
        assert!(metrics.roi.is_nan());
        let flagged: Vec<DerivedMetric> = issues.iter().map(|(m, _)| *m).collect();
        assert_eq!(flagged, vec![DerivedMetric::Roi, DerivedMetric::BreakEvenPoint]);
    }

    #[test]
    fn zero_estate_area_leaves_per_hectare_metrics_undefined() {
        let derivation = derive_metrics(
            &company(vec![("Okomu", 1000.0, 600.0, 200.0, 2000.0)]),
            &state(vec![("Edo", 0.0)]),
            &EstateAlignment::SourceRow,
        )
        .unwrap();
        let t = &derivation.company;
        assert!(metric_value(t, 0, DerivedMetric::ProfitPerHectare).is_nan());
        assert!(metric_value(t, 0, DerivedMetric::BreakEvenPoint).is_nan());
        assert_eq!(metric_value(t, 0, DerivedMetric::ProfitMargin), 20.0);
        assert_eq!(metric_value(t, 0, DerivedMetric::Roi), 10.0);

        let flagged: Vec<DerivedMetric> = derivation.issues.iter().map(|i| i.metric).collect();
        assert_eq!(flagged.len(), 2);
        assert!(flagged.contains(&DerivedMetric::ProfitPerHectare));
        assert!(flagged.contains(&DerivedMetric::BreakEvenPoint));
        assert!(derivation
            .issues
            .iter()
            .all(|i| matches!(i.error, DashboardError::DivisionUndefined { .. })));
    }

    #[test]
    fn source_row_alignment_survives_dropped_rows() {
        let full_state = state(vec![("Edo", 100.0), ("Delta", 50.0)]);
        // Only the second state row survived cleaning.
        let cleaned_state = full_state.with_rows("state_comparison", vec![full_state.rows[1].clone()]);
        let company_table = company(vec![
            ("Okomu", 1000.0, 600.0, 200.0, 2000.0),
            ("Presco", 1000.0, 500.0, 200.0, 2000.0),
        ]);

        let derivation =
            derive_metrics(&company_table, &cleaned_state, &EstateAlignment::SourceRow).unwrap();
        let t = &derivation.company;
        assert!(metric_value(t, 0, DerivedMetric::ProfitPerHectare).is_nan());
        assert_eq!(metric_value(t, 1, DerivedMetric::ProfitPerHectare), 10.0);
        assert!(matches!(
            derivation.issues[0].error,
            DashboardError::EstateAreaUnavailable { .. }
        ));
    }

    #[test]
    fn by_state_alignment_joins_on_state_name() {
        let alignment = EstateAlignment::ByState {
            company_states: BTreeMap::from([("Presco".to_string(), "Delta".to_string())]),
        };
        let derivation = derive_metrics(
            &company(vec![
                ("Okomu", 1000.0, 600.0, 200.0, 2000.0),
                ("Presco", 1000.0, 500.0, 200.0, 2000.0),
            ]),
            &state(vec![("Edo", 100.0), ("Delta", 50.0)]),
            &alignment,
        )
        .unwrap();
        let t = &derivation.company;
        assert!(metric_value(t, 0, DerivedMetric::ProfitPerHectare).is_nan());
        assert_eq!(metric_value(t, 1, DerivedMetric::ProfitPerHectare), 10.0);
        assert_eq!(metric_value(t, 1, DerivedMetric::BreakEvenPoint), 50.0);
    }
}
