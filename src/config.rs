//! Dashboard configuration, read from an optional JSON file plus environment overrides.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Path of the JSON config file, when not `dashboard.json` in the working directory.
pub const CONFIG_ENV: &str = "ENERGY_DASHBOARD_CONFIG";
/// Overrides `data_dir`.
pub const DATA_DIR_ENV: &str = "ENERGY_DASHBOARD_DATA_DIR";
const DEFAULT_CONFIG_FILE: &str = "dashboard.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory holding the CSV resources.
    pub data_dir: PathBuf,
    /// Last year of actual data; later years are forecasts.
    pub actual_cutoff: f64,
    /// Shown in place of an undefined derived value.
    pub placeholder: String,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Per CSV file name, fields whose zero values mean "no data". Replaces that
    /// dataset's built-in zero policy.
    pub zero_as_missing: BTreeMap<String, Vec<String>>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("public/data"),
            actual_cutoff: 2025.0,
            placeholder: crate::data::DEFAULT_PLACEHOLDER.to_string(),
            log_filter: "info".to_string(),
            zero_as_missing: BTreeMap::new(),
        }
    }
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the config for this process: the file named by `ENERGY_DASHBOARD_CONFIG`,
    /// else `dashboard.json` if present, else defaults; then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        Ok(config.with_overrides(std::env::var_os(DATA_DIR_ENV)))
    }

    fn with_overrides(mut self, data_dir: Option<OsString>) -> Self {
        if let Some(dir) = data_dir.filter(|d| !d.is_empty()) {
            info!(data_dir = ?dir, "data directory overridden from environment");
            self.data_dir = PathBuf::from(dir);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "data_dir": "/srv/energy", "actual_cutoff": 2024 }}"#).unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/energy"));
        assert_eq!(config.actual_cutoff, 2024.0);
        assert_eq!(config.placeholder, "–");
        assert_eq!(config.log_filter, "info");
        assert!(config.zero_as_missing.is_empty());
    }

    #[test]
    fn zero_as_missing_fields_by_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "zero_as_missing": {{ "chart2.csv": ["Coal", "Gas"] }} }}"#).unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config.zero_as_missing.get("chart2.csv"),
            Some(&vec!["Coal".to_string(), "Gas".to_string()])
        );
    }

    #[test]
    fn invalid_json_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            DashboardConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DashboardConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn data_dir_override_wins() {
        let config = DashboardConfig::default().with_overrides(Some(OsString::from("/tmp/csv")));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/csv"));

        let config = DashboardConfig::default().with_overrides(Some(OsString::new()));
        assert_eq!(config.data_dir, PathBuf::from("public/data"));
    }
}
