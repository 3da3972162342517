use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub futures_dir: PathBuf,
    pub equity_dir: PathBuf,
    pub sector_file: PathBuf,
    /// CSV reports are written here and read back as history.
    pub archive_dir: PathBuf,
    pub workbook_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            futures_dir: PathBuf::from("fo_data"),
            equity_dir: PathBuf::from("equity_data"),
            sector_file: PathBuf::from("index.csv"),
            archive_dir: PathBuf::from("generated_csv_data"),
            workbook_dir: PathBuf::from("generated_data"),
        }
    }
}

/// Column names of the upstream exchange files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSettings {
    pub contract: String,
    pub futures_close: String,
    pub open_interest: String,
    pub spot_symbol: String,
    pub spot_close: String,
    pub sector_symbol: String,
    pub sector_name: String,
}

impl Default for ColumnSettings {
    fn default() -> Self {
        Self {
            contract: "CONTRACT_D".to_string(),
            futures_close: "CLOSE_PRIC".to_string(),
            open_interest: "OI_NO_CON".to_string(),
            spot_symbol: "SYMBOL".to_string(),
            spot_close: "CLOSE_PRICE".to_string(),
            sector_symbol: "Symbol".to_string(),
            sector_name: "Sectoral Index".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub months: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { months: 6 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpirySettings {
    pub switch_date: NaiveDate,
}

impl Default for ExpirySettings {
    fn default() -> Self {
        Self {
            switch_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathSettings,
    pub columns: ColumnSettings,
    pub history: HistorySettings,
    pub expiry: ExpirySettings,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Falls back to defaults when the file does not exist; a file that exists
    /// but does not parse is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str(
            "paths:\n  archive_dir: out/csv\nhistory:\n  months: 3\n",
        )
        .unwrap();

        assert_eq!(config.paths.archive_dir, PathBuf::from("out/csv"));
        assert_eq!(config.paths.futures_dir, PathBuf::from("fo_data"));
        assert_eq!(config.history.months, 3);
        assert_eq!(config.columns.contract, "CONTRACT_D");
        assert_eq!(
            config.expiry.switch_date,
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = Config::load_or_default("does/not/exist.yaml").unwrap();
        assert_eq!(config.history.months, 6);
    }
}
