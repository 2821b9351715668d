use rusqlite::Connection;
use tracing::info;

use crate::db::executor::{run, QueryResult};
use crate::error::LibraryResult;
use crate::validation::{optional_text, require_text};

/// Register a reader. Phone and email are optional.
pub fn add_reader(
    conn: &Connection,
    full_name: &str,
    phone: &str,
    email: &str,
) -> LibraryResult<i64> {
    let full_name = require_text(full_name, "Full name")?;
    let phone = optional_text(phone);
    let email = optional_text(email);
    run(
        conn,
        "INSERT INTO readers (full_name, phone, email) VALUES (?1, ?2, ?3)",
        &[Some(full_name.as_str()), phone.as_deref(), email.as_deref()],
    )
    .affected()?;
    let id = conn.last_insert_rowid();
    info!(id, %full_name, "reader added");
    Ok(id)
}

/// All readers with a flag telling whether they currently hold any book.
pub fn list_readers(conn: &Connection) -> LibraryResult<QueryResult> {
    run(
        conn,
        "SELECT r.reader_id AS id, r.full_name, r.phone, r.email,
                CASE WHEN EXISTS (
                         SELECT 1 FROM loans l
                         WHERE l.reader_id = r.reader_id AND l.return_date IS NULL
                     )
                     THEN 'Has books'
                     ELSE 'No books'
                END AS status
         FROM readers r
         ORDER BY r.reader_id",
        &[],
    )
    .rows()
}

/// Open loans held by one reader, with full book details.
pub fn reader_loans(conn: &Connection, reader_id: i64) -> LibraryResult<QueryResult> {
    let raw_id = reader_id.to_string();
    run(
        conn,
        "SELECT l.loan_id AS loan, b.book_id AS book_id, b.title,
                a.name AS author, g.name AS genre,
                p.name AS publisher, lg.name AS language,
                b.year, b.pages, l.loan_date
         FROM loans l
         JOIN books b      ON l.book_id = b.book_id
         JOIN authors a    ON b.author_id = a.author_id
         JOIN genres g     ON b.genre_id = g.genre_id
         JOIN publishers p ON b.publisher_id = p.publisher_id
         JOIN languages lg ON b.language_id = lg.language_id
         WHERE l.reader_id = CAST(?1 AS INTEGER)
           AND l.return_date IS NULL
         ORDER BY l.loan_id",
        &[Some(raw_id.as_str())],
    )
    .rows()
}
