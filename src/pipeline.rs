use crate::data::clean::drop_incomplete;
use crate::data::filter::{distinct_values, filter_eq, scalar_f64};
use crate::data::loader::{DatasetKind, DatasetSource};
use crate::data::metrics::{DerivedMetric, EstateAlignment, MetricIssue, derive_metrics};
use crate::data::model::{CellValue, Table};
use crate::error::{DashboardError, Result};

/// Columns shown for the selected state.
pub const STATE_VIEW_COLUMNS: &[&str] = &[
    "state",
    "avg_cost_per_ha",
    "avg_temp",
    "avg_humidity",
    "avg_wind_speed",
    "avg_ph",
    "avg_n",
    "avg_oc",
];

/// Columns shown for the selected year.
pub const PRODUCTION_VIEW_COLUMNS: &[&str] = &["year", "Production", "Imports", "Exports"];

/// Columns shown for the selected company.
pub const COMPANY_VIEW_COLUMNS: &[&str] = &[
    "metric",
    "Revenue",
    "Cost of revenue",
    "Profit Margin",
    "Profit per Hectare",
    "ROI",
    "Break-even Point",
];

// ---------------------------------------------------------------------------
// Datasets – the six tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Datasets {
    pub company: Table,
    pub state: Table,
    pub production: Table,
    pub input_materials: Table,
    pub land_market: Table,
    pub results: Table,
}

impl Datasets {
    /// Load all six datasets; the first failure aborts.
    pub fn load(source: &dyn DatasetSource) -> Result<Self> {
        Ok(Self {
            company: source.load(DatasetKind::Company)?,
            state: source.load(DatasetKind::State)?,
            production: source.load(DatasetKind::Production)?,
            input_materials: source.load(DatasetKind::InputMaterials)?,
            land_market: source.load(DatasetKind::LandMarket)?,
            results: source.load(DatasetKind::Results)?,
        })
    }

    pub fn get(&self, kind: DatasetKind) -> &Table {
        match kind {
            DatasetKind::Company => &self.company,
            DatasetKind::State => &self.state,
            DatasetKind::Production => &self.production,
            DatasetKind::InputMaterials => &self.input_materials,
            DatasetKind::LandMarket => &self.land_market,
            DatasetKind::Results => &self.results,
        }
    }

    fn get_mut(&mut self, kind: DatasetKind) -> &mut Table {
        match kind {
            DatasetKind::Company => &mut self.company,
            DatasetKind::State => &mut self.state,
            DatasetKind::Production => &mut self.production,
            DatasetKind::InputMaterials => &mut self.input_materials,
            DatasetKind::LandMarket => &mut self.land_market,
            DatasetKind::Results => &mut self.results,
        }
    }
}

/// Per-dataset load statistics for the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub kind: DatasetKind,
    pub location: String,
    pub loaded: usize,
    pub dropped: usize,
}

// ---------------------------------------------------------------------------
// PreparedData – cleaned and derived, ready for selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PreparedData {
    pub datasets: Datasets,
    pub issues: Vec<MetricIssue>,
    pub summary: Vec<DatasetSummary>,
}

/// Load, clean, and derive.
pub fn prepare(source: &dyn DatasetSource, alignment: &EstateAlignment) -> Result<PreparedData> {
    let mut datasets = Datasets::load(source)?;
    let mut summary = Vec::with_capacity(DatasetKind::ALL.len());

    for kind in DatasetKind::ALL {
        let table = datasets.get_mut(kind);
        let loaded = table.len();
        let cleaned = drop_incomplete(table, kind.required_columns())?;
        *table = cleaned.table;
        summary.push(DatasetSummary {
            kind,
            location: source.describe(kind),
            loaded,
            dropped: cleaned.dropped,
        });
    }

    let derivation = derive_metrics(&datasets.company, &datasets.state, alignment)?;
    datasets.company = derivation.company;
    if !derivation.issues.is_empty() {
        log::warn!(
            "{} derived metric(s) undefined; shown as 'undefined'",
            derivation.issues.len()
        );
    }

    Ok(PreparedData {
        datasets,
        issues: derivation.issues,
        summary,
    })
}

/// Values available to each selector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectorOptions {
    pub states: Vec<CellValue>,
    pub years: Vec<CellValue>,
    pub companies: Vec<CellValue>,
}

/// The three selector values. `None` selects nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub state: Option<CellValue>,
    pub year: Option<CellValue>,
    pub company: Option<CellValue>,
}

impl Selection {
    /// Fill unset selectors with the first available option.
    pub fn or_first(self, options: &SelectorOptions) -> Selection {
        Selection {
            state: self.state.or_else(|| options.states.first().cloned()),
            year: self.year.or_else(|| options.years.first().cloned()),
            company: self.company.or_else(|| options.companies.first().cloned()),
        }
    }

    pub fn company_label(&self) -> String {
        self.company
            .as_ref()
            .map(CellValue::to_text)
            .unwrap_or_default()
    }
}

impl PreparedData {
    pub fn selector_options(&self) -> Result<SelectorOptions> {
        Ok(SelectorOptions {
            states: distinct_values(&self.datasets.state, "state")?,
            years: distinct_values(&self.datasets.production, "year")?,
            companies: distinct_values(&self.datasets.company, "metric")?,
        })
    }

    /// Filter the three tables for `selection` and extract ROI and break-even.
    pub fn view(&self, selection: &Selection) -> Result<DashboardView> {
        let select = |table: &Table, column: &str, value: &Option<CellValue>| {
            filter_eq(table, column, value.as_ref().unwrap_or(&CellValue::Null))
        };
        let state_rows = select(&self.datasets.state, "state", &selection.state)?
            .select_columns(STATE_VIEW_COLUMNS)?;
        let production_rows = select(&self.datasets.production, "year", &selection.year)?
            .select_columns(PRODUCTION_VIEW_COLUMNS)?;
        let company_rows = select(&self.datasets.company, "metric", &selection.company)?
            .select_columns(COMPANY_VIEW_COLUMNS)?;

        let state_cost = scalar_f64(&state_rows, "avg_cost_per_ha");
        let roi = scalar_f64(&company_rows, DerivedMetric::Roi.column());
        let break_even = scalar_f64(&company_rows, DerivedMetric::BreakEvenPoint.column());
        for result in [&state_cost, &roi] {
            if let Err(e @ DashboardError::NotFound { .. }) = result {
                log::warn!("{e}");
            }
        }

        let issues = company_rows
            .rows
            .iter()
            .flat_map(|row| self.issues.iter().filter(move |i| i.source_row == row.source_index))
            .cloned()
            .collect();

        Ok(DashboardView {
            selection: selection.clone(),
            state_rows,
            production_rows,
            company_rows,
            state_cost,
            roi,
            break_even,
            issues,
        })
    }
}

// ---------------------------------------------------------------------------
// DashboardView – what the presentation layer draws
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DashboardView {
    pub selection: Selection,
    pub state_rows: Table,
    pub production_rows: Table,
    pub company_rows: Table,
    /// `avg_cost_per_ha` of the selected state.
    pub state_cost: Result<f64>,
    pub roi: Result<f64>,
    pub break_even: Result<f64>,
    /// Metric issues for the selected company's rows.
    pub issues: Vec<MetricIssue>,
}

fn format_scalar(value: &Result<f64>, unit: &str) -> String {
    match value {
        Ok(v) if v.is_finite() => format!("{v:.2}{unit}"),
        Ok(_) => "undefined".to_string(),
        Err(e) => e.user_message(),
    }
}

impl DashboardView {
    pub fn state_cost_text(&self) -> String {
        let state = self
            .selection
            .state
            .as_ref()
            .map(CellValue::to_text)
            .unwrap_or_default();
        format!(
            "Cost per Hectare for {state}: {}",
            format_scalar(&self.state_cost, "")
        )
    }

    pub fn roi_text(&self) -> String {
        format!(
            "ROI for {}: {}",
            self.selection.company_label(),
            format_scalar(&self.roi, "%")
        )
    }

    pub fn break_even_text(&self) -> String {
        format!(
            "Break-even Point for {}: {}",
            self.selection.company_label(),
            format_scalar(&self.break_even, " hectares")
        )
    }
}

/// Run the whole pipeline for one selection.
pub fn run(
    source: &dyn DatasetSource,
    alignment: &EstateAlignment,
    selection: Selection,
) -> Result<(PreparedData, DashboardView)> {
    let prepared = prepare(source, alignment)?;
    let selection = selection.or_first(&prepared.selector_options()?);
    let view = prepared.view(&selection)?;
    Ok((prepared, view))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::cell::Cell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    use super::*;
    use crate::data::loader::read_csv;

    /// In-memory source built from CSV text, counting loads.
    pub struct MemorySource {
        pub tables: BTreeMap<DatasetKind, String>,
        pub loads: Rc<Cell<usize>>,
    }

    impl MemorySource {
        pub fn new() -> Self {
            let mut tables = BTreeMap::new();
            tables.insert(
                DatasetKind::Company,
                "metric,Revenue,Cost of revenue,Profit for the year,Net assets\n\
                 Okomu,1000,600,200,2000\n\
                 Presco,0,500,100,1000\n"
                    .to_string(),
            );
            tables.insert(
                DatasetKind::State,
                "state,avg_cost_per_ha,avg_temp,avg_humidity,avg_wind_speed,avg_ph,avg_n,avg_oc,total_estate_area\n\
                 Edo,1200,27.1,80,2.1,5.2,0.12,1.3,100\n\
                 Delta,1100,27.5,82,2.4,5.0,0.10,1.1,50\n\
                 Ondo,,26.9,78,2.0,5.4,0.11,1.2,70\n"
                    .to_string(),
            );
            tables.insert(
                DatasetKind::Production,
                "year,Production,Imports,Exports\n2019,1000,300,20\n2020,1025,350,15\n"
                    .to_string(),
            );
            tables.insert(DatasetKind::InputMaterials, "material,cost\nfertilizer,10\n".to_string());
            tables.insert(DatasetKind::LandMarket, "state,price_per_ha\nEdo,500\n".to_string());
            tables.insert(DatasetKind::Results, "metric,value\nyield,3.2\n".to_string());
            Self {
                tables,
                loads: Rc::new(Cell::new(0)),
            }
        }
    }

    impl DatasetSource for MemorySource {
        fn describe(&self, kind: DatasetKind) -> String {
            format!("memory:{kind}")
        }

        fn load(&self, kind: DatasetKind) -> Result<Table> {
            self.loads.set(self.loads.get() + 1);
            let text = self
                .tables
                .get(&kind)
                .ok_or_else(|| DashboardError::DataUnavailable {
                    dataset: kind.to_string(),
                    reason: "not in fixture".to_string(),
                })?;
            csv_table(kind.table_name(), text)
        }
    }

    /// Parse CSV text the way the file loader does.
    pub fn csv_table(name: &str, text: &str) -> Result<Table> {
        read_csv(csv::Reader::from_reader(text.as_bytes()), name).map_err(|e| {
            DashboardError::DataUnavailable {
                dataset: name.to_string(),
                reason: format!("{e:#}"),
            }
        })
    }
}
