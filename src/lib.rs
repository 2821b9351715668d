//! Core library surface for the library console application.
//!
//! `db` owns every statement and the rules that keep book counts consistent
//! with loans; `ui` is the Ratatui front-end that collects raw input and
//! renders results through `table`.
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod table;
pub mod ui;
pub mod validation;

/// Convenience re-exports for the persistence layer.
pub use db::{open_database, open_in_memory, QueryOutcome, QueryResult};

pub use config::{AppConfig, Cli};
pub use error::{ErrorCategory, LibraryError, LibraryResult};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
