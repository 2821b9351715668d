//! Single entry point for running statements. Values cross this boundary as
//! text in both directions: parameters are bound as strings (or NULL), and
//! every result cell comes back as a `String`. Consumers parse what they need.

use std::str::FromStr;

use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, warn};

use crate::error::{LibraryError, LibraryResult};

/// Ordered column names plus ordered rows of cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
    }

    /// Parse one cell into a typed value, treating anything unexpected as a
    /// query failure since the statement shapes are fixed.
    pub fn parse_cell<T: FromStr>(&self, row: usize, column: usize) -> LibraryResult<T> {
        let raw = self.cell(row, column).ok_or_else(|| {
            LibraryError::QueryFailure(format!("missing cell at row {row}, column {column}"))
        })?;
        raw.parse::<T>().map_err(|_| {
            LibraryError::QueryFailure(format!("unexpected value '{raw}' in result"))
        })
    }
}

/// What running a statement produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Rows(QueryResult),
    Command { affected: usize },
    Failed(String),
}

impl QueryOutcome {
    pub fn is_ok(&self) -> bool {
        !matches!(self, QueryOutcome::Failed(_))
    }

    /// Rows of a query; a command acknowledgement yields an empty result.
    pub fn rows(self) -> LibraryResult<QueryResult> {
        match self {
            QueryOutcome::Rows(result) => Ok(result),
            QueryOutcome::Command { .. } => Ok(QueryResult::default()),
            QueryOutcome::Failed(message) => Err(LibraryError::QueryFailure(message)),
        }
    }

    pub fn affected(self) -> LibraryResult<usize> {
        match self {
            QueryOutcome::Rows(result) => Ok(result.len()),
            QueryOutcome::Command { affected } => Ok(affected),
            QueryOutcome::Failed(message) => Err(LibraryError::QueryFailure(message)),
        }
    }
}

/// Execute `sql` with positional `?n` parameters. `None` binds SQL NULL.
///
/// Failures are reported through [`QueryOutcome::Failed`] rather than
/// returned as errors, so callers must inspect the outcome before reading.
pub fn run(conn: &Connection, sql: &str, params: &[Option<&str>]) -> QueryOutcome {
    match try_run(conn, sql, params) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(error = %err, "statement failed");
            QueryOutcome::Failed(err.to_string())
        }
    }
}

fn try_run(
    conn: &Connection,
    sql: &str,
    params: &[Option<&str>],
) -> rusqlite::Result<QueryOutcome> {
    debug!(sql = %compact(sql), params = params.len(), "running statement");
    let mut stmt = conn.prepare(sql)?;

    if stmt.column_count() == 0 {
        let affected = stmt.execute(params_from_iter(params.iter()))?;
        return Ok(QueryOutcome::Command { affected });
    }

    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut cursor = stmt.query(params_from_iter(params.iter()))?;
    while let Some(row) = cursor.next()? {
        let mut cells = Vec::with_capacity(width);
        for index in 0..width {
            cells.push(cell_text(row.get_ref(index)?));
        }
        rows.push(cells);
    }

    Ok(QueryOutcome::Rows(QueryResult { columns, rows }))
}

fn cell_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(number) => number.to_string(),
        ValueRef::Real(number) => number.to_string(),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}

/// Collapse whitespace so multi-line statements log on one line.
fn compact(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn select_returns_text_cells_and_names() {
        let conn = open_in_memory().unwrap();
        let result = run(
            &conn,
            "SELECT 7 AS id, 'Толстой' AS name, NULL AS country",
            &[],
        )
        .rows()
        .unwrap();
        assert_eq!(result.columns, vec!["id", "name", "country"]);
        assert_eq!(result.rows, vec![vec!["7", "Толстой", ""]]);
        assert_eq!(result.parse_cell::<i64>(0, 0).unwrap(), 7);
    }

    #[test]
    fn insert_is_a_command_acknowledgement() {
        let conn = open_in_memory().unwrap();
        let outcome = run(
            &conn,
            "INSERT INTO genres (name) VALUES (?1)",
            &[Some("Poetry")],
        );
        assert_eq!(outcome, QueryOutcome::Command { affected: 1 });
    }

    #[test]
    fn parameters_are_never_spliced_into_sql() {
        let conn = open_in_memory().unwrap();
        let hostile = "x'); DROP TABLE genres; --";
        assert!(run(&conn, "INSERT INTO genres (name) VALUES (?1)", &[Some(hostile)]).is_ok());
        let result = run(&conn, "SELECT name FROM genres", &[]).rows().unwrap();
        assert_eq!(result.cell(0, 0), Some(hostile));
    }

    #[test]
    fn failures_carry_the_engine_message() {
        let conn = open_in_memory().unwrap();
        let outcome = run(&conn, "INSERT INTO genres (name) VALUES (?1)", &[None]);
        match outcome {
            QueryOutcome::Failed(message) => assert!(message.contains("NOT NULL")),
            other => panic!("expected failure, got {other:?}"),
        }
        let err = run(&conn, "SELEKT 1", &[]).rows().unwrap_err();
        assert!(matches!(err, LibraryError::QueryFailure(_)));
    }

    #[test]
    fn unparsable_cells_are_query_failures() {
        let conn = open_in_memory().unwrap();
        let result = run(&conn, "SELECT 'abc'", &[]).rows().unwrap();
        assert!(result.parse_cell::<i64>(0, 0).is_err());
        assert!(result.parse_cell::<i64>(3, 0).is_err());
    }
}
