use std::fmt;

use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// CellValue – a single cell in a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the Pandas dtypes the datasets use.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Null,
}

impl Eq for CellValue {}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            // 0.0 and -0.0 compare equal, so they must hash alike.
            CellValue::Float(f) => (if *f == 0.0 { 0.0f64 } else { *f }).to_bits().hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) if v.is_nan() => write!(f, "undefined"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

/// Tokens Pandas reads as NaN by default.
const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A",
];

pub fn is_missing_token(s: &str) -> bool {
    MISSING_TOKENS.contains(&s.trim())
}

impl CellValue {
    /// Numeric view of the value; strings and nulls have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Null, or a float NaN as Pandas would treat it.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Exact-match equality used by selectors. Integers and floats compare
    /// numerically; missing values never match.
    pub fn matches(&self, target: &CellValue) -> bool {
        if self.is_missing() || target.is_missing() {
            return false;
        }
        match (self, target) {
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Integer(a), CellValue::Integer(b)) => a == b,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }

    /// Plain text form; missing values are empty.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::String(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(v) => v.to_string(),
            CellValue::Null => String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnType – inferred scalar type of a whole column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    String,
}

impl ColumnType {
    /// Infer a column type from raw text cells. Missing tokens are ignored;
    /// a column with no present values is float, as in Pandas.
    pub fn infer<'a>(raw: impl IntoIterator<Item = &'a str>) -> ColumnType {
        let mut ty = ColumnType::Integer;
        let mut seen = false;
        for s in raw {
            if is_missing_token(s) {
                continue;
            }
            seen = true;
            let s = s.trim();
            match ty {
                ColumnType::Integer if s.parse::<i64>().is_ok() => {}
                ColumnType::Integer | ColumnType::Float if s.parse::<f64>().is_ok() => {
                    ty = ColumnType::Float;
                }
                _ => return ColumnType::String,
            }
        }
        if seen {
            ty
        } else {
            ColumnType::Float
        }
    }

    /// Parse one raw cell under this column type.
    pub fn parse(self, raw: &str) -> CellValue {
        if is_missing_token(raw) {
            return CellValue::Null;
        }
        match self {
            ColumnType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(CellValue::Integer)
                .unwrap_or(CellValue::Null),
            ColumnType::Float => raw
                .trim()
                .parse::<f64>()
                .map(CellValue::Float)
                .unwrap_or(CellValue::Null),
            ColumnType::String => CellValue::String(raw.to_string()),
        }
    }

    /// The narrowest type able to hold every value in `cells`.
    fn unify<'a>(cells: impl IntoIterator<Item = &'a CellValue>) -> ColumnType {
        let mut ty: Option<ColumnType> = None;
        for cell in cells {
            let cell_ty = match cell {
                CellValue::Integer(_) => ColumnType::Integer,
                CellValue::Float(_) => ColumnType::Float,
                CellValue::String(_) => ColumnType::String,
                CellValue::Null => continue,
            };
            ty = Some(match (ty, cell_ty) {
                (None, t) => t,
                (Some(ColumnType::String), _) | (_, ColumnType::String) => ColumnType::String,
                (Some(ColumnType::Float), _) | (_, ColumnType::Float) => ColumnType::Float,
                _ => ColumnType::Integer,
            });
        }
        ty.unwrap_or(ColumnType::Float)
    }

    fn coerce(self, cell: CellValue) -> CellValue {
        match (self, cell) {
            (_, CellValue::Null) => CellValue::Null,
            (ColumnType::Float, CellValue::Integer(i)) => CellValue::Float(i as f64),
            (ColumnType::String, v @ (CellValue::Integer(_) | CellValue::Float(_))) => {
                CellValue::String(v.to_text())
            }
            (_, v) => v,
        }
    }
}

// ---------------------------------------------------------------------------
// Table – named columns over rows that remember their source position
// ---------------------------------------------------------------------------

/// One table row. `source_index` is the row's position in the source file
/// and survives cleaning and filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub source_index: usize,
    pub cells: Vec<CellValue>,
}

/// An immutable, column-typed table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub column_types: Vec<ColumnType>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Build a table from typed cells, unifying each column to a single type.
    /// Rows are numbered by position. Fails if a row's width differs from
    /// the header.
    pub fn from_cells(
        name: impl Into<String>,
        columns: Vec<String>,
        cells: Vec<Vec<CellValue>>,
    ) -> Result<Self> {
        let name = name.into();
        if let Some((i, row)) = cells
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(DashboardError::DataUnavailable {
                dataset: name,
                reason: format!(
                    "row {i} has {} fields but the header has {}",
                    row.len(),
                    columns.len()
                ),
            });
        }

        let column_types: Vec<ColumnType> = (0..columns.len())
            .map(|c| ColumnType::unify(cells.iter().map(|row| &row[c])))
            .collect();

        let rows = cells
            .into_iter()
            .enumerate()
            .map(|(source_index, row)| Row {
                source_index,
                cells: row
                    .into_iter()
                    .zip(&column_types)
                    .map(|(cell, ty)| ty.coerce(cell))
                    .collect(),
            })
            .collect();

        Ok(Table {
            name,
            columns,
            column_types,
            rows,
        })
    }

    /// A table with the same schema holding `rows`.
    pub fn with_rows(&self, name: impl Into<String>, rows: Vec<Row>) -> Table {
        Table {
            name: name.into(),
            columns: self.columns.clone(),
            column_types: self.column_types.clone(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Like [`Table::column_index`] but reports a missing column as an error.
    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| DashboardError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// All values of a column in row order.
    pub fn column_values(&self, column: &str) -> Result<Vec<&CellValue>> {
        let idx = self.require_column(column)?;
        Ok(self.rows.iter().map(|r| &r.cells[idx]).collect())
    }

    /// Numeric values of a column paired with the row label in `label_column`.
    /// Rows where either side is missing or non-numeric are skipped.
    pub fn labelled_f64(&self, label_column: &str, column: &str) -> Result<Vec<(String, f64)>> {
        let label_idx = self.require_column(label_column)?;
        let idx = self.require_column(column)?;
        Ok(self
            .rows
            .iter()
            .filter_map(|r| {
                let v = r.cells[idx].as_f64()?;
                let label = &r.cells[label_idx];
                (!label.is_missing()).then(|| (label.to_string(), v))
            })
            .collect())
    }

    /// Append a column of values, one per row.
    pub fn push_column(&mut self, column: &str, ty: ColumnType, values: Vec<CellValue>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.columns.push(column.to_string());
        self.column_types.push(ty);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.cells.push(value);
        }
    }

    /// Project the table onto `columns`, in the given order.
    pub fn select_columns(&self, columns: &[&str]) -> Result<Table> {
        let indices = columns
            .iter()
            .map(|c| self.require_column(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Table {
            name: self.name.clone(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            column_types: indices.iter().map(|&i| self.column_types[i]).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| Row {
                    source_index: r.source_index,
                    cells: indices.iter().map(|&i| r.cells[i].clone()).collect(),
                })
                .collect(),
        })
    }
}
