use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::data::loader::{DatasetKind, FileSource};
use crate::data::metrics::EstateAlignment;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "palm-dash.toml";

/// Per-dataset file overrides. Relative paths resolve against `data_dir`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetFiles {
    pub company: Option<PathBuf>,
    pub state: Option<PathBuf>,
    pub production: Option<PathBuf>,
    pub input_materials: Option<PathBuf>,
    pub land_market: Option<PathBuf>,
    pub results: Option<PathBuf>,
}

impl DatasetFiles {
    fn get(&self, kind: DatasetKind) -> Option<&PathBuf> {
        match kind {
            DatasetKind::Company => self.company.as_ref(),
            DatasetKind::State => self.state.as_ref(),
            DatasetKind::Production => self.production.as_ref(),
            DatasetKind::InputMaterials => self.input_materials.as_ref(),
            DatasetKind::LandMarket => self.land_market.as_ref(),
            DatasetKind::Results => self.results.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Base directory for dataset files.
    pub data_dir: PathBuf,
    /// Re-load every dataset on each selector change.
    pub reload_on_select: bool,
    pub datasets: DatasetFiles,
    pub estate_alignment: EstateAlignment,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("datasets"),
            reload_on_select: true,
            datasets: DatasetFiles::default(),
            estate_alignment: EstateAlignment::default(),
        }
    }
}

impl DashboardConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("parsing configuration")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Configuration for a run: the explicit `--config` file, else
    /// `./palm-dash.toml` if present, else defaults; then CLI overrides.
    pub fn resolve(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        if let Some(dir) = &args.data_dir {
            config.data_dir = dir.clone();
        }
        log::debug!("Configuration: {config:?}");
        Ok(config)
    }

    /// Resolved file path of every dataset.
    pub fn dataset_paths(&self) -> BTreeMap<DatasetKind, PathBuf> {
        DatasetKind::ALL
            .iter()
            .map(|&kind| {
                let path = match self.datasets.get(kind) {
                    Some(p) if p.is_absolute() => p.clone(),
                    Some(p) => self.data_dir.join(p),
                    None => self.data_dir.join(kind.default_file_name()),
                };
                (kind, path)
            })
            .collect()
    }

    pub fn file_source(&self) -> FileSource {
        FileSource::new(self.dataset_paths())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_point_at_datasets_dir() {
        let config = DashboardConfig::default();
        assert!(config.reload_on_select);
        assert_eq!(config.estate_alignment, EstateAlignment::SourceRow);
        assert_eq!(
            config.dataset_paths()[&DatasetKind::Company],
            PathBuf::from("datasets/company_comparison.csv")
        );
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(DashboardConfig::from_toml("").unwrap(), DashboardConfig::default());
    }

    #[test]
    fn parses_overrides_and_state_join() {
        let config = DashboardConfig::from_toml(
            r#"
            data_dir = "/srv/palm"
            reload_on_select = false

            [datasets]
            company = "companies.json"
            results = "/tmp/results.parquet"

            [estate_alignment]
            mode = "by_state"

            [estate_alignment.company_states]
            Okomu = "Edo"
            "#,
        )
        .unwrap();

        assert!(!config.reload_on_select);
        let paths = config.dataset_paths();
        assert_eq!(paths[&DatasetKind::Company], PathBuf::from("/srv/palm/companies.json"));
        assert_eq!(paths[&DatasetKind::Results], PathBuf::from("/tmp/results.parquet"));
        assert_eq!(
            paths[&DatasetKind::State],
            PathBuf::from("/srv/palm/state_comparison.csv")
        );
        match config.estate_alignment {
            EstateAlignment::ByState { company_states } => {
                assert_eq!(company_states.get("Okomu").map(String::as_str), Some("Edo"));
            }
            other => panic!("unexpected alignment: {other:?}"),
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(DashboardConfig::from_toml("data_directory = \"x\"").is_err());
        assert!(DashboardConfig::from_toml("[estate_alignment]\nmode = \"by_zip\"").is_err());
    }

    #[test]
    fn cli_data_dir_overrides_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("palm-dash.toml");
        fs::write(&path, "data_dir = \"from-file\"\n").unwrap();

        let args = Args {
            config: Some(path),
            data_dir: Some(PathBuf::from("from-cli")),
            ..Args::default()
        };
        let config = DashboardConfig::resolve(&args).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("from-cli"));
    }

    #[test]
    fn unreadable_config_file_is_an_error() {
        let args = Args {
            config: Some(PathBuf::from("/nonexistent/palm-dash.toml")),
            ..Args::default()
        };
        assert!(DashboardConfig::resolve(&args).is_err());
    }
}
