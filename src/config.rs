//! Application configuration (YAML).
//!
//! Every key is optional; anything missing from the file falls back to the
//! built-in default, so a config file only needs the values it changes.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SieveError};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub sheets: SheetsConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Names of the two required input sheets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub data_sheet: String,
    pub filter_sheet: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            data_sheet: "总表".to_string(),
            filter_sheet: "总表筛选".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving every artifact of a run.
    pub directory: PathBuf,
    /// Prefix of condition identifiers (`condition_1`, `condition_2`, ...).
    pub condition_prefix: String,
    /// Reserved ordinal field left out of header-only CSV files.
    pub ordinal_field: String,
    /// Clear the output directory before a run.
    pub clean_before_run: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("outputs"),
            condition_prefix: "condition_".to_string(),
            ordinal_field: "序号".to_string(),
            clean_before_run: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
    /// Log file; empty disables file logging.
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: "app.log".to_string(),
        }
    }
}

impl AppConfig {
    /// Load `path`, or return defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(AppConfig::default());
        }
        let content = fs::read_to_string(path).map_err(|err| SieveError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_yaml(&content).map_err(|message| SieveError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse YAML text; an empty document yields the defaults.
    pub fn from_yaml(content: &str) -> std::result::Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(AppConfig::default());
        }
        serde_yaml::from_str(content).map_err(|err| err.to_string())
    }

    /// Write the configuration as YAML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_err = |message: String| SieveError::Config {
            path: path.to_path_buf(),
            message,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| config_err(err.to_string()))?;
        }
        let content = serde_yaml::to_string(self).map_err(|err| config_err(err.to_string()))?;
        fs::write(path, content).map_err(|err| config_err(err.to_string()))?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_source_workbook_layout() {
        let config = AppConfig::default();
        assert_eq!(config.sheets.data_sheet, "总表");
        assert_eq!(config.sheets.filter_sheet, "总表筛选");
        assert_eq!(config.output.directory, PathBuf::from("outputs"));
        assert_eq!(config.output.condition_prefix, "condition_");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = AppConfig::from_yaml("sheets:\n  data_sheet: 新总表\n").unwrap();
        assert_eq!(config.sheets.data_sheet, "新总表");
        assert_eq!(config.sheets.filter_sheet, "总表筛选");
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(AppConfig::from_yaml("  \n").unwrap(), AppConfig::default());
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        assert!(AppConfig::from_yaml("output: [1, 2").is_err());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let mut config = AppConfig::default();
        config.output.condition_prefix = "条件_".to_string();
        config.output.clean_before_run = false;
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
