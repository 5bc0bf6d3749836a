//! Arguments shared by the binaries.

use crate::config::CliConfig;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(clap::Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to a TOML config file. Its values override the flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database file.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Directory for the log file. Logs go to stdout only when unset.
    #[clap(long, value_parser = parse_path)]
    pub log_dir: Option<PathBuf>,
}

impl CommonArgs {
    pub fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db_path.clone(),
            log_dir: self.log_dir.clone(),
            ..CliConfig::default()
        }
    }
}
