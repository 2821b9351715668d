use rusqlite::Connection;
use tracing::info;

use crate::db::executor::{run, QueryResult};
use crate::error::LibraryResult;
use crate::validation::{optional_text, require_text};

/// Insert an author; a blank country is stored as NULL.
pub fn add_author(conn: &Connection, name: &str, country: &str) -> LibraryResult<i64> {
    let name = require_text(name, "Author name")?;
    let country = optional_text(country);
    run(
        conn,
        "INSERT INTO authors (name, country) VALUES (?1, ?2)",
        &[Some(name.as_str()), country.as_deref()],
    )
    .affected()?;
    let id = conn.last_insert_rowid();
    info!(id, %name, "author added");
    Ok(id)
}

pub fn add_genre(conn: &Connection, name: &str) -> LibraryResult<i64> {
    insert_named(conn, "INSERT INTO genres (name) VALUES (?1)", name, "Genre name")
}

pub fn add_publisher(conn: &Connection, name: &str, city: &str) -> LibraryResult<i64> {
    let name = require_text(name, "Publisher name")?;
    let city = optional_text(city);
    run(
        conn,
        "INSERT INTO publishers (name, city) VALUES (?1, ?2)",
        &[Some(name.as_str()), city.as_deref()],
    )
    .affected()?;
    let id = conn.last_insert_rowid();
    info!(id, %name, "publisher added");
    Ok(id)
}

pub fn add_language(conn: &Connection, name: &str) -> LibraryResult<i64> {
    insert_named(
        conn,
        "INSERT INTO languages (name) VALUES (?1)",
        name,
        "Language name",
    )
}

fn insert_named(conn: &Connection, sql: &str, name: &str, field: &str) -> LibraryResult<i64> {
    let name = require_text(name, field)?;
    run(conn, sql, &[Some(name.as_str())]).affected()?;
    let id = conn.last_insert_rowid();
    info!(id, %name, "{} added", field.to_lowercase());
    Ok(id)
}

pub fn list_authors(conn: &Connection) -> LibraryResult<QueryResult> {
    run(
        conn,
        "SELECT author_id AS id, name, country FROM authors ORDER BY author_id",
        &[],
    )
    .rows()
}

pub fn list_genres(conn: &Connection) -> LibraryResult<QueryResult> {
    run(
        conn,
        "SELECT genre_id AS id, name FROM genres ORDER BY genre_id",
        &[],
    )
    .rows()
}

pub fn list_publishers(conn: &Connection) -> LibraryResult<QueryResult> {
    run(
        conn,
        "SELECT publisher_id AS id, name, city FROM publishers ORDER BY publisher_id",
        &[],
    )
    .rows()
}

pub fn list_languages(conn: &Connection) -> LibraryResult<QueryResult> {
    run(
        conn,
        "SELECT language_id AS id, name FROM languages ORDER BY language_id",
        &[],
    )
    .rows()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::error::LibraryError;

    #[test]
    fn authors_list_in_id_order_with_optional_country() {
        let conn = open_in_memory().unwrap();
        add_author(&conn, "Tolkien", "UK").unwrap();
        add_author(&conn, " Akhmatova ", "  ").unwrap();
        let authors = list_authors(&conn).unwrap();
        assert_eq!(authors.columns, vec!["id", "name", "country"]);
        assert_eq!(
            authors.rows,
            vec![vec!["1", "Tolkien", "UK"], vec!["2", "Akhmatova", ""]]
        );
        let nulls: i64 = conn
            .query_row("SELECT COUNT(*) FROM authors WHERE country IS NULL", [], |row| row.get(0))
            .unwrap();
        assert_eq!(nulls, 1);
    }

    #[test]
    fn names_are_required() {
        let conn = open_in_memory().unwrap();
        assert!(matches!(add_genre(&conn, ""), Err(LibraryError::Validation(_))));
        assert!(matches!(add_language(&conn, " "), Err(LibraryError::Validation(_))));
        assert!(list_genres(&conn).unwrap().is_empty());
    }

    #[test]
    fn publishers_keep_their_city() {
        let conn = open_in_memory().unwrap();
        let id = add_publisher(&conn, "Penguin", "London").unwrap();
        assert_eq!(id, 1);
        add_language(&conn, "English").unwrap();
        let publishers = list_publishers(&conn).unwrap();
        assert_eq!(publishers.rows, vec![vec!["1", "Penguin", "London"]]);
        assert_eq!(list_languages(&conn).unwrap().len(), 1);
    }
}
