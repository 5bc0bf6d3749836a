mod dataset;
mod file_config;

pub use dataset::{
    ConfigurationKeyMissing, DatasetConfig, DatasetOverrides, DerivedSeries, RawTable,
};
pub use file_config::FileConfig;

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "database.db";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_CHART_DIR: &str = "charts";

/// CLI arguments that can be used for config resolution.
/// Each binary fills in the fields it exposes as flags.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub log_dir: Option<PathBuf>,
    pub chart_dir: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            data_dir: None,
            port: 8000,
            logging_level: RequestsLoggingLevel::default(),
            log_dir: None,
            chart_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub log_dir: Option<PathBuf>,
    pub chart_dir: PathBuf,

    pub dataset: DatasetConfig,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        if db_path.is_dir() {
            bail!("db_path points to a directory: {:?}", db_path);
        }

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .or_else(|| cli.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let port = file.port.unwrap_or(cli.port);

        let logging_level = match file.logging_level {
            Some(s) => match parse_logging_level(&s) {
                Some(level) => level,
                None => bail!("Invalid logging_level in config file: {}", s),
            },
            None => cli.logging_level.clone(),
        };

        let log_dir = file.log_dir.map(PathBuf::from).or_else(|| cli.log_dir.clone());

        let chart_dir = file
            .chart_dir
            .map(PathBuf::from)
            .or_else(|| cli.chart_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CHART_DIR));

        let dataset = match &file.dataset {
            Some(overrides) => DatasetConfig::default().with_overrides(overrides)?,
            None => DatasetConfig::default(),
        };

        Ok(Self {
            db_path,
            data_dir,
            port,
            logging_level,
            log_dir,
            chart_dir,
            dataset,
        })
    }

    /// Loads the TOML file if a path is given, then resolves.
    pub fn load(cli: &CliConfig, config_file: Option<&std::path::Path>) -> Result<Self> {
        let file_config = match config_file {
            Some(path) => Some(FileConfig::load(path)?),
            None => None,
        };
        Self::resolve(cli, file_config)
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
