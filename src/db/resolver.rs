//! Turn an operator-typed token into a row id.
//!
//! Digits are treated as an id and checked for existence. Anything else is a
//! case-insensitive substring search over the entity's name column: one hit
//! resolves immediately, several hits come back as a [`Disambiguation`] that
//! the caller completes with [`choose`] once the operator has picked an id.

use rusqlite::Connection;
use tracing::debug;

use crate::db::executor::{run, QueryResult};
use crate::error::{LibraryError, LibraryResult};
use crate::validation::is_number;

/// Table and column names for one searchable entity. Only these constants
/// are ever concatenated into statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub table: &'static str,
    pub id_column: &'static str,
    pub name_column: &'static str,
    pub label: &'static str,
}

pub const AUTHORS: Lookup = Lookup {
    table: "authors",
    id_column: "author_id",
    name_column: "name",
    label: "author",
};

pub const GENRES: Lookup = Lookup {
    table: "genres",
    id_column: "genre_id",
    name_column: "name",
    label: "genre",
};

pub const PUBLISHERS: Lookup = Lookup {
    table: "publishers",
    id_column: "publisher_id",
    name_column: "name",
    label: "publisher",
};

pub const LANGUAGES: Lookup = Lookup {
    table: "languages",
    id_column: "language_id",
    name_column: "name",
    label: "language",
};

pub const READERS: Lookup = Lookup {
    table: "readers",
    id_column: "reader_id",
    name_column: "full_name",
    label: "reader",
};

pub const BOOKS: Lookup = Lookup {
    table: "books",
    id_column: "book_id",
    name_column: "title",
    label: "book",
};

/// Outcome of the first resolution step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(i64),
    Ambiguous(Disambiguation),
}

/// Several rows matched a name. `candidates` is ready to render (columns
/// `id`, `name`), `ids` is the set the follow-up answer must come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disambiguation {
    pub lookup: Lookup,
    pub query: String,
    pub candidates: QueryResult,
    pub ids: Vec<i64>,
}

/// First step: resolve `input` or report the candidate set.
pub fn resolve(conn: &Connection, lookup: Lookup, input: &str) -> LibraryResult<Resolution> {
    let input = input.trim();
    if input.is_empty() {
        return Err(LibraryError::EmptyInput);
    }

    if is_number(input) {
        return find_by_id(conn, lookup, input).map(Resolution::Resolved);
    }

    let matches = search_by_name(conn, lookup, input)?;
    match matches.len() {
        0 => Err(LibraryError::not_found(lookup.label, input)),
        1 => {
            let id = matches.parse_cell::<i64>(0, 0)?;
            debug!(entity = lookup.label, input, id, "resolved by name");
            Ok(Resolution::Resolved(id))
        }
        count => {
            debug!(entity = lookup.label, input, count, "name is ambiguous");
            let ids = (0..count)
                .map(|row| matches.parse_cell::<i64>(row, 0))
                .collect::<LibraryResult<Vec<_>>>()?;
            Ok(Resolution::Ambiguous(Disambiguation {
                lookup,
                query: input.to_string(),
                candidates: matches,
                ids,
            }))
        }
    }
}

/// Second step: validate the operator's pick against the candidate set and
/// re-check that the row still exists.
pub fn choose(conn: &Connection, pending: &Disambiguation, choice: &str) -> LibraryResult<i64> {
    let choice = choice.trim();
    if !is_number(choice) {
        return Err(LibraryError::InvalidChoice);
    }

    let listed = choice
        .parse::<i64>()
        .ok()
        .filter(|id| pending.ids.contains(id));
    if listed.is_none() {
        return Err(LibraryError::not_found(pending.lookup.label, choice));
    }

    find_by_id(conn, pending.lookup, choice)
}

/// Exact id lookup. `raw_id` is digits only; a value outside `i64` can never
/// be a row id, so it is `NotFound` before any statement runs.
pub fn find_by_id(conn: &Connection, lookup: Lookup, raw_id: &str) -> LibraryResult<i64> {
    let Ok(id) = raw_id.parse::<i64>() else {
        return Err(LibraryError::not_found(lookup.label, raw_id));
    };
    let sql = format!(
        "SELECT {id} FROM {table} WHERE {id} = CAST(?1 AS INTEGER)",
        id = lookup.id_column,
        table = lookup.table,
    );
    let id_text = id.to_string();
    let result = run(conn, &sql, &[Some(id_text.as_str())]).rows()?;
    if result.is_empty() {
        return Err(LibraryError::not_found(lookup.label, raw_id));
    }
    result.parse_cell(0, 0)
}

/// Whether a row with this id exists.
pub fn exists(conn: &Connection, lookup: Lookup, id: i64) -> LibraryResult<bool> {
    match find_by_id(conn, lookup, &id.to_string()) {
        Ok(_) => Ok(true),
        Err(LibraryError::NotFound { .. }) => Ok(false),
        Err(err) => Err(err),
    }
}

fn search_by_name(conn: &Connection, lookup: Lookup, needle: &str) -> LibraryResult<QueryResult> {
    let sql = format!(
        "SELECT {id} AS id, {name} AS name FROM {table}
         WHERE instr(fold_case({name}), fold_case(?1)) > 0
         ORDER BY {id}",
        id = lookup.id_column,
        name = lookup.name_column,
        table = lookup.table,
    );
    run(conn, &sql, &[Some(needle)]).rows()
}
