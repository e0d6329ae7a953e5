use thiserror::Error;

/// Errors raised by the metrics & filter engine.
///
/// Variants are cheap to clone (owned strings or static names) so views and
/// metric issues can keep a copy of the error that produced them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    /// A dataset could not be read, parsed, or lacks its required columns.
    #[error("Dataset '{dataset}' unavailable: {reason}")]
    DataUnavailable { dataset: String, reason: String },

    /// A derived metric's denominator is zero or itself undefined.
    #[error("{metric} is undefined: {denominator} is zero or undefined")]
    DivisionUndefined {
        metric: &'static str,
        denominator: &'static str,
    },

    /// A filtered selection matched no rows when one was expected.
    #[error("No rows in {table} to read '{column}' from")]
    NotFound { table: String, column: String },

    #[error("Column not found in {table}: {column}")]
    MissingColumn { table: String, column: String },

    #[error("Column '{column}' in {table} holds a non-numeric value: {value}")]
    NotNumeric {
        table: String,
        column: String,
        value: String,
    },

    /// No total estate area could be paired with a company row.
    #[error("No estate area for '{company}': {reason}")]
    EstateAreaUnavailable { company: String, reason: String },
}

impl DashboardError {
    /// Short text for the dashboard when a selection yields nothing to show.
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::NotFound { .. } => "no data for this selection".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;
