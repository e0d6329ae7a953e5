//! Command-line options.

use clap::Parser;
use std::path::PathBuf;

/// Palm oil plantation profitability dashboard.
#[derive(Parser, Debug, Default)]
#[command(name = "palm-dash", version, about)]
pub struct Args {
    /// Configuration file (default: ./palm-dash.toml when present)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the six dataset files; overrides `data_dir`
    #[arg(short, long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Print the selection report to stdout instead of opening a window
    #[arg(long)]
    pub report: bool,

    /// State to select (default: first state in the data)
    #[arg(long, value_name = "STATE")]
    pub state: Option<String>,

    /// Year to select (default: first year in the data)
    #[arg(long, value_name = "YEAR")]
    pub year: Option<i64>,

    /// Company to select (default: first company in the data)
    #[arg(long, value_name = "COMPANY")]
    pub company: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_report_selection() {
        let args = Args::parse_from([
            "palm-dash",
            "--data-dir",
            "datasets",
            "--report",
            "--year",
            "2020",
            "--company",
            "Okomu",
        ]);
        assert!(args.report);
        assert_eq!(args.year, Some(2020));
        assert_eq!(args.company.as_deref(), Some("Okomu"));
        assert_eq!(args.data_dir, Some(PathBuf::from("datasets")));
        assert!(args.state.is_none());
    }
}
