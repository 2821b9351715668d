//! Binary entry point: resolve configuration, start logging, open the
//! database, and drive the Ratatui event loop until the user exits.
use anyhow::Context;
use clap::Parser;
use library_console::logging::init_tracing;
use library_console::{open_database, run_app, App, AppConfig, Cli};
use tracing::info;

/// A database that cannot be opened ends the process here with a non-zero
/// status, before the terminal is switched to raw mode.
fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_cli(Cli::parse())?;
    init_tracing(&config.log_file)?;
    info!(database = %config.database.display(), "starting library console");

    let conn = open_database(&config.database).context("cannot start without a database")?;

    let mut app = App::new(conn);
    let result = run_app(&mut app);
    info!("library console stopped");
    result
}
