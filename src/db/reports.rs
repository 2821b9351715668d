//! Book listings. Every report shares one column layout so the renderer and
//! anyone scripting against the output see the same shape:
//! `id, title, author, genre, publisher, language, year, pages,
//! copies_total, copies_available, status`.

use rusqlite::Connection;

use crate::db::executor::{run, QueryResult};
use crate::error::LibraryResult;
use crate::models::Comparison;

const BOOK_REPORT: &str = "SELECT b.book_id AS id, b.title, a.name AS author, g.name AS genre,
        p.name AS publisher, l.name AS language, b.year, b.pages,
        b.copies_total, b.copies_available,
        CASE WHEN b.copies_available > 0 THEN 'In stock' ELSE 'Out of stock' END AS status
 FROM books b
 JOIN authors a    ON b.author_id = a.author_id
 JOIN genres g     ON b.genre_id = g.genre_id
 JOIN publishers p ON b.publisher_id = p.publisher_id
 JOIN languages l  ON b.language_id = l.language_id";

fn book_report(
    conn: &Connection,
    filter: Option<&str>,
    order: &str,
    params: &[Option<&str>],
) -> LibraryResult<QueryResult> {
    let sql = match filter {
        Some(filter) => format!("{BOOK_REPORT} WHERE {filter} ORDER BY {order}"),
        None => format!("{BOOK_REPORT} ORDER BY {order}"),
    };
    run(conn, &sql, params).rows()
}

pub fn list_books(conn: &Connection) -> LibraryResult<QueryResult> {
    book_report(conn, None, "b.book_id", &[])
}

/// Books with at least one copy on the shelf.
pub fn available_books(conn: &Connection) -> LibraryResult<QueryResult> {
    book_report(conn, Some("b.copies_available > 0"), "b.book_id", &[])
}

pub fn books_by_year(conn: &Connection, op: Comparison, year: i64) -> LibraryResult<QueryResult> {
    let filter = format!("b.year {} CAST(?1 AS INTEGER)", op.as_sql());
    let raw = year.to_string();
    book_report(conn, Some(&filter), "b.year, b.book_id", &[Some(raw.as_str())])
}

pub fn books_by_pages(conn: &Connection, op: Comparison, pages: i64) -> LibraryResult<QueryResult> {
    let filter = format!("b.pages {} CAST(?1 AS INTEGER)", op.as_sql());
    let raw = pages.to_string();
    book_report(conn, Some(&filter), "b.pages, b.book_id", &[Some(raw.as_str())])
}

pub fn books_by_author(conn: &Connection, author_id: i64) -> LibraryResult<QueryResult> {
    by_reference(conn, "a.author_id", author_id)
}

pub fn books_by_genre(conn: &Connection, genre_id: i64) -> LibraryResult<QueryResult> {
    by_reference(conn, "g.genre_id", genre_id)
}

pub fn books_by_publisher(conn: &Connection, publisher_id: i64) -> LibraryResult<QueryResult> {
    by_reference(conn, "p.publisher_id", publisher_id)
}

fn by_reference(conn: &Connection, column: &str, id: i64) -> LibraryResult<QueryResult> {
    let filter = format!("{column} = CAST(?1 AS INTEGER)");
    let raw = id.to_string();
    book_report(conn, Some(&filter), "b.book_id", &[Some(raw.as_str())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        add_author, add_genre, add_language, add_or_merge_book, add_publisher, add_reader,
        open_in_memory, open_loan,
    };
    use crate::models::BookDraft;

    fn shelf() -> Connection {
        let mut conn = open_in_memory().unwrap();
        add_author(&conn, "Pushkin", "Russia").unwrap();
        add_author(&conn, "Austen", "UK").unwrap();
        add_genre(&conn, "Poetry").unwrap();
        add_genre(&conn, "Novel").unwrap();
        add_publisher(&conn, "Eksmo", "Moscow").unwrap();
        add_language(&conn, "Russian").unwrap();
        add_reader(&conn, "Onegin", "", "").unwrap();
        let books = [
            ("Евгений Онегин", 1, 1, "1833", "224", "1"),
            ("Emma", 2, 2, "1815", "474", "2"),
            ("Persuasion", 2, 2, "1817", "249", "1"),
        ];
        for (title, author_id, genre_id, year, pages, copies) in books {
            add_or_merge_book(
                &mut conn,
                &BookDraft {
                    title: title.into(),
                    author_id,
                    genre_id,
                    publisher_id: 1,
                    language_id: 1,
                    year: year.into(),
                    pages: pages.into(),
                    copies: copies.into(),
                },
            )
            .unwrap();
        }
        open_loan(&mut conn, 1, 1, "2024-01-01").unwrap();
        conn
    }

    fn titles(result: &QueryResult) -> Vec<&str> {
        (0..result.len()).filter_map(|row| result.cell(row, 1)).collect()
    }

    #[test]
    fn listing_uses_the_reporting_columns() {
        let conn = shelf();
        let books = list_books(&conn).unwrap();
        assert_eq!(
            books.columns,
            vec![
                "id",
                "title",
                "author",
                "genre",
                "publisher",
                "language",
                "year",
                "pages",
                "copies_total",
                "copies_available",
                "status"
            ]
        );
        assert_eq!(books.cell(0, 10), Some("Out of stock"));
        assert_eq!(books.cell(1, 10), Some("In stock"));
    }

    #[test]
    fn year_and_page_filters_sort_by_the_filtered_column() {
        let conn = shelf();
        let old = books_by_year(&conn, Comparison::Less, 1830).unwrap();
        assert_eq!(titles(&old), vec!["Emma", "Persuasion"]);
        let exact = books_by_year(&conn, Comparison::Equal, 1833).unwrap();
        assert_eq!(titles(&exact), vec!["Евгений Онегин"]);
        let long = books_by_pages(&conn, Comparison::Greater, 230).unwrap();
        assert_eq!(titles(&long), vec!["Persuasion", "Emma"]);
    }

    #[test]
    fn reference_filters_and_availability() {
        let conn = shelf();
        assert_eq!(titles(&books_by_author(&conn, 2).unwrap()), vec!["Emma", "Persuasion"]);
        assert_eq!(titles(&books_by_genre(&conn, 1).unwrap()), vec!["Евгений Онегин"]);
        assert_eq!(books_by_publisher(&conn, 1).unwrap().len(), 3);
        assert_eq!(titles(&available_books(&conn).unwrap()), vec!["Emma", "Persuasion"]);
    }
}
