use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, ColumnType, Row, Table};
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// The six datasets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatasetKind {
    Company,
    State,
    Production,
    InputMaterials,
    LandMarket,
    Results,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 6] = [
        DatasetKind::Company,
        DatasetKind::State,
        DatasetKind::Production,
        DatasetKind::InputMaterials,
        DatasetKind::LandMarket,
        DatasetKind::Results,
    ];

    /// Table name, also the stem of the default file name.
    pub fn table_name(self) -> &'static str {
        match self {
            DatasetKind::Company => "company_comparison",
            DatasetKind::State => "state_comparison",
            DatasetKind::Production => "production_comparison",
            DatasetKind::InputMaterials => "input_materials_comparison",
            DatasetKind::LandMarket => "land_market",
            DatasetKind::Results => "results",
        }
    }

    pub fn default_file_name(self) -> String {
        format!("{}.csv", self.table_name())
    }

    /// Columns the dashboard reads. Rows missing any of them are dropped
    /// during cleaning; ancillary tables require none.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            DatasetKind::Company => &[
                "metric",
                "Revenue",
                "Cost of revenue",
                "Profit for the year",
                "Net assets",
            ],
            DatasetKind::State => &[
                "state",
                "avg_cost_per_ha",
                "avg_temp",
                "avg_humidity",
                "avg_wind_speed",
                "avg_ph",
                "avg_n",
                "avg_oc",
                "total_estate_area",
            ],
            DatasetKind::Production => &["year", "Production", "Imports", "Exports"],
            DatasetKind::InputMaterials | DatasetKind::LandMarket | DatasetKind::Results => &[],
        }
    }
}

impl DatasetKind {
    /// The required text column naming each row; every other required
    /// column must be numeric.
    pub fn label_column(self) -> Option<&'static str> {
        match self {
            DatasetKind::Company => Some("metric"),
            DatasetKind::State => Some("state"),
            _ => None,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

// ---------------------------------------------------------------------------
// DatasetSource – where tables come from
// ---------------------------------------------------------------------------

/// Supplies the raw tables. Implemented over files for the application and
/// over in-memory fixtures in tests.
pub trait DatasetSource {
    /// Human-readable location of a dataset, for logs and the UI.
    fn describe(&self, kind: DatasetKind) -> String;

    /// Load one dataset, failing with [`DashboardError::DataUnavailable`].
    fn load(&self, kind: DatasetKind) -> Result<Table, DashboardError>;
}

/// Reads each dataset from a file path.
#[derive(Debug, Clone)]
pub struct FileSource {
    paths: BTreeMap<DatasetKind, PathBuf>,
}

impl FileSource {
    pub fn new(paths: BTreeMap<DatasetKind, PathBuf>) -> Self {
        Self { paths }
    }

    pub fn path(&self, kind: DatasetKind) -> Option<&Path> {
        self.paths.get(&kind).map(PathBuf::as_path)
    }
}

impl DatasetSource for FileSource {
    fn describe(&self, kind: DatasetKind) -> String {
        match self.path(kind) {
            Some(p) => p.display().to_string(),
            None => "<unconfigured>".to_string(),
        }
    }

    fn load(&self, kind: DatasetKind) -> Result<Table, DashboardError> {
        let unavailable = |reason: String| DashboardError::DataUnavailable {
            dataset: kind.table_name().to_string(),
            reason,
        };
        let path = self
            .path(kind)
            .ok_or_else(|| unavailable("no path configured".to_string()))?;

        let table = load_file(path, kind.table_name())
            .map_err(|e| unavailable(format!("{}: {e:#}", path.display())))?;
        validate_schema(kind, &table)?;

        log::info!(
            "Loaded {} from {} ({} rows, {} columns)",
            kind,
            path.display(),
            table.len(),
            table.columns.len()
        );
        Ok(table)
    }
}

/// Check that every required column of `kind` is present and that the
/// numeric ones were read as numbers.
pub fn validate_schema(kind: DatasetKind, table: &Table) -> Result<(), DashboardError> {
    let unavailable = |reason: String| DashboardError::DataUnavailable {
        dataset: kind.table_name().to_string(),
        reason,
    };
    let missing: Vec<&str> = kind
        .required_columns()
        .iter()
        .copied()
        .filter(|c| table.column_index(c).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(unavailable(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    for &column in kind.required_columns() {
        if Some(column) == kind.label_column() {
            continue;
        }
        let idx = table.require_column(column)?;
        if table.column_types[idx] == ColumnType::String {
            return Err(unavailable(format!("column '{column}' is not numeric")));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// File entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row plus one record per row
/// * `.json`    – `[{ "column": value, ... }, ...]`
/// * `.parquet` – flat scalar columns
pub fn load_file(path: &Path, name: &str) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path, name),
        "json" => load_json(path, name),
        "parquet" | "pq" => load_parquet(path, name),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, name: &str) -> Result<Table> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .context("opening CSV")?;
    read_csv(reader, name)
}

/// Read a whole CSV stream into a table.
///
/// Column types are inferred from the raw text of the whole column before
/// any cell is converted, so string columns keep their original text.
pub fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>, name: &str) -> Result<Table> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(String::is_empty) {
        bail!("CSV has no header row");
    }

    let mut raw_rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        raw_rows.push(record);
    }

    let column_types: Vec<ColumnType> = (0..headers.len())
        .map(|c| ColumnType::infer(raw_rows.iter().map(|r| r.get(c).unwrap_or(""))))
        .collect();

    let rows = raw_rows
        .iter()
        .enumerate()
        .map(|(source_index, record)| Row {
            source_index,
            cells: column_types
                .iter()
                .enumerate()
                .map(|(c, ty)| ty.parse(record.get(c).unwrap_or("")))
                .collect(),
        })
        .collect();

    Ok(Table {
        name: name.to_string(),
        columns: headers,
        column_types,
        rows,
    })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Columns are the union of all record keys.
///
/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "state": "Edo", "avg_temp": 27.1, ... },
///   ...
/// ]
/// ```
fn load_json(path: &Path, name: &str) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
        objects.push(obj);
    }
    if columns.is_empty() {
        bail!("JSON records define no columns");
    }

    let cells: Vec<Vec<CellValue>> = objects
        .iter()
        .map(|obj| {
            columns
                .iter()
                .map(|c| obj.get(c).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect::<Vec<_>>()
        })
        .collect();

    Ok(Table::from_cells(name, columns, cells)?)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of flat scalar columns (strings, ints, floats,
/// bools). Works with files written by both Pandas and Polars.
fn load_parquet(path: &Path, name: &str) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut cells = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let values = batch
                .columns()
                .iter()
                .zip(&columns)
                .map(|(col, col_name)| {
                    extract_cell(col, row)
                        .with_context(|| format!("Row {row}: failed to read '{col_name}'"))
                })
                .collect::<Result<Vec<_>>>()?;
            cells.push(values);
        }
    }

    Ok(Table::from_cells(name, columns, cells)?)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::String(col.as_boolean().value(row).to_string()),
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(cell)
}
