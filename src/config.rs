//! Command-line and environment configuration.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-console";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "library.sqlite";
/// Log file written next to the database; the TUI owns stdout.
const LOG_FILE_NAME: &str = "library.log";

#[derive(Debug, Parser)]
#[command(name = "library-console", version, about = "Library catalog, readers and loans")]
pub struct Cli {
    /// Path to the SQLite database file.
    #[arg(long, env = "LIBRARY_DB_PATH")]
    pub database: Option<PathBuf>,

    /// Where to write the diagnostic log.
    #[arg(long, env = "LIBRARY_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

/// Fully resolved settings for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database: PathBuf,
    pub log_file: PathBuf,
}

impl AppConfig {
    /// Fill in whatever the command line left out with paths under the home
    /// directory.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let data_dir = || -> Result<PathBuf> {
            let base_dirs =
                BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
            Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
        };

        let database = match cli.database {
            Some(path) => path,
            None => data_dir()?.join(DB_FILE_NAME),
        };
        let log_file = match cli.log_file {
            Some(path) => path,
            None => data_dir()?.join(LOG_FILE_NAME),
        };

        Ok(Self { database, log_file })
    }
}
