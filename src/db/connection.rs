use std::fs;
use std::path::Path;

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{LibraryError, LibraryResult};

/// Tables in creation order. Foreign keys only point backwards in this list.
const SCHEMA: &[(&str, &str)] = &[
    (
        "authors",
        "CREATE TABLE IF NOT EXISTS authors (
            author_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            country TEXT
        )",
    ),
    (
        "genres",
        "CREATE TABLE IF NOT EXISTS genres (
            genre_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )",
    ),
    (
        "publishers",
        "CREATE TABLE IF NOT EXISTS publishers (
            publisher_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            city TEXT
        )",
    ),
    (
        "languages",
        "CREATE TABLE IF NOT EXISTS languages (
            language_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )",
    ),
    (
        "readers",
        "CREATE TABLE IF NOT EXISTS readers (
            reader_id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            phone TEXT,
            email TEXT
        )",
    ),
    (
        "books",
        "CREATE TABLE IF NOT EXISTS books (
            book_id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            author_id INTEGER NOT NULL REFERENCES authors(author_id),
            genre_id INTEGER NOT NULL REFERENCES genres(genre_id),
            publisher_id INTEGER NOT NULL REFERENCES publishers(publisher_id),
            language_id INTEGER NOT NULL REFERENCES languages(language_id),
            year INTEGER NOT NULL,
            pages INTEGER NOT NULL,
            copies_total INTEGER NOT NULL,
            copies_available INTEGER NOT NULL,
            CHECK (copies_available >= 0 AND copies_available <= copies_total)
        )",
    ),
    (
        "loans",
        "CREATE TABLE IF NOT EXISTS loans (
            loan_id INTEGER PRIMARY KEY AUTOINCREMENT,
            book_id INTEGER REFERENCES books(book_id) ON DELETE SET NULL,
            reader_id INTEGER NOT NULL REFERENCES readers(reader_id),
            loan_date TEXT NOT NULL,
            return_date TEXT
        )",
    ),
];

/// Open (creating if needed) the database file at `path` and bring the schema
/// up to date. Any failure here is fatal for the session.
pub fn open_database(path: &Path) -> LibraryResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                LibraryError::ConnectionFailure(format!(
                    "failed to create data directory {}: {err}",
                    parent.display()
                ))
            })?;
        }
    }

    let conn = Connection::open(path).map_err(|err| {
        LibraryError::ConnectionFailure(format!("failed to open {}: {err}", path.display()))
    })?;
    prepare_connection(&conn)?;
    info!(path = %path.display(), "library database ready");
    Ok(conn)
}

/// Fresh database living only as long as the connection. Used by tests.
pub fn open_in_memory() -> LibraryResult<Connection> {
    let conn = Connection::open_in_memory()
        .map_err(|err| LibraryError::ConnectionFailure(err.to_string()))?;
    prepare_connection(&conn)?;
    Ok(conn)
}

/// Enable foreign keys, register `fold_case`, and run the lazy migrations.
fn prepare_connection(conn: &Connection) -> LibraryResult<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .map_err(|err| connection_step("failed to enable foreign keys", err))?;

    register_fold_case(conn)
        .map_err(|err| connection_step("failed to register fold_case", err))?;

    for (table, ddl) in SCHEMA {
        conn.execute(ddl, [])
            .map_err(|err| connection_step(&format!("failed to create {table} table"), err))?;
        debug!(table, "schema checked");
    }

    Ok(())
}

/// SQLite's own `lower()` only folds ASCII, so Cyrillic names would never
/// match case-insensitively without this.
fn register_fold_case(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value = ctx.get::<Option<String>>(0)?;
            Ok(value.map(|text| text.to_lowercase()))
        },
    )
}

fn connection_step(step: &str, err: rusqlite::Error) -> LibraryError {
    LibraryError::ConnectionFailure(format!("{step}: {err}"))
}
