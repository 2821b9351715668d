//! Copy counts for books. `copies_total` and `copies_available` are a
//! denormalized view of the loan ledger, so every path that changes them runs
//! its check and its write inside one immediate transaction.

use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::db::executor::run;
use crate::db::resolver::{exists, Lookup, AUTHORS, GENRES, LANGUAGES, PUBLISHERS};
use crate::error::{LibraryError, LibraryResult};
use crate::models::{BookDraft, BookStored, CopiesRemoved, NewBook};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookCounts {
    pub copies_total: i64,
    pub copies_available: i64,
}

/// Add `copies` of a book, merging into an existing row when the natural key
/// (title, author, genre, publisher, language, year, pages) already exists.
pub fn add_or_merge_book(conn: &mut Connection, draft: &BookDraft) -> LibraryResult<BookStored> {
    let (book, copies) = draft.validate()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let references: [(Lookup, i64); 4] = [
        (AUTHORS, book.author_id),
        (GENRES, book.genre_id),
        (PUBLISHERS, book.publisher_id),
        (LANGUAGES, book.language_id),
    ];
    for (lookup, id) in references {
        if !exists(&tx, lookup, id)? {
            return Err(LibraryError::not_found(lookup.label, id.to_string()));
        }
    }

    let stored = match find_same_book(&tx, &book)? {
        Some(book_id) => {
            let raw_copies = copies.to_string();
            let raw_id = book_id.to_string();
            run(
                &tx,
                "UPDATE books
                 SET copies_total = copies_total + CAST(?1 AS INTEGER),
                     copies_available = copies_available + CAST(?1 AS INTEGER)
                 WHERE book_id = CAST(?2 AS INTEGER)",
                &[Some(raw_copies.as_str()), Some(raw_id.as_str())],
            )
            .affected()?;
            let counts = book_counts(&tx, book_id)?;
            BookStored::Merged {
                book_id,
                copies_total: counts.copies_total,
                copies_available: counts.copies_available,
            }
        }
        None => {
            let fields = natural_key_params(&book);
            let raw_copies = copies.to_string();
            run(
                &tx,
                "INSERT INTO books (title, author_id, genre_id, publisher_id, language_id,
                                    year, pages, copies_total, copies_available)
                 VALUES (?1, CAST(?2 AS INTEGER), CAST(?3 AS INTEGER), CAST(?4 AS INTEGER),
                         CAST(?5 AS INTEGER), CAST(?6 AS INTEGER), CAST(?7 AS INTEGER),
                         CAST(?8 AS INTEGER), CAST(?8 AS INTEGER))",
                &[
                    Some(fields[0].as_str()),
                    Some(fields[1].as_str()),
                    Some(fields[2].as_str()),
                    Some(fields[3].as_str()),
                    Some(fields[4].as_str()),
                    Some(fields[5].as_str()),
                    Some(fields[6].as_str()),
                    Some(raw_copies.as_str()),
                ],
            )
            .affected()?;
            BookStored::Inserted {
                book_id: tx.last_insert_rowid(),
                copies,
            }
        }
    };

    tx.commit()?;
    info!(?stored, "book stock added");
    Ok(stored)
}

/// Remove `count` shelf copies of a book, deleting the row when none remain.
pub fn delete_copies(
    conn: &mut Connection,
    book_id: i64,
    count: i64,
) -> LibraryResult<CopiesRemoved> {
    if count <= 0 {
        return Err(LibraryError::validation(
            "Number of copies to remove must be greater than zero.",
        ));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let counts = book_counts(&tx, book_id)?;
    let active_loans = active_loan_count(&tx, book_id)?;
    debug!(book_id, count, ?counts, active_loans, "checking copy removal");

    if count > counts.copies_available {
        warn!(book_id, count, "removal exceeds shelf copies");
        return Err(LibraryError::InsufficientAvailable {
            requested: count,
            available: counts.copies_available,
        });
    }

    let remaining = counts.copies_total - count;
    if remaining < active_loans {
        warn!(book_id, count, active_loans, "removal would strand open loans");
        return Err(LibraryError::WouldViolateLoanInvariant {
            requested: count,
            remaining,
            active_loans,
        });
    }

    let raw_id = book_id.to_string();
    let removed = if remaining <= 0 {
        run(
            &tx,
            "DELETE FROM books WHERE book_id = CAST(?1 AS INTEGER)",
            &[Some(raw_id.as_str())],
        )
        .affected()?;
        CopiesRemoved::BookDeleted { book_id }
    } else {
        let available = counts.copies_available - count;
        let raw_total = remaining.to_string();
        let raw_available = available.to_string();
        run(
            &tx,
            "UPDATE books
             SET copies_total = CAST(?1 AS INTEGER), copies_available = CAST(?2 AS INTEGER)
             WHERE book_id = CAST(?3 AS INTEGER)",
            &[Some(raw_total.as_str()), Some(raw_available.as_str()), Some(raw_id.as_str())],
        )
        .affected()?;
        CopiesRemoved::Reduced {
            book_id,
            copies_total: remaining,
            copies_available: available,
        }
    };

    tx.commit()?;
    info!(?removed, "book copies removed");
    Ok(removed)
}

/// Current counts for a book, or `NotFound`.
pub fn book_counts(conn: &Connection, book_id: i64) -> LibraryResult<BookCounts> {
    let raw_id = book_id.to_string();
    let result = run(
        conn,
        "SELECT copies_total, copies_available FROM books WHERE book_id = CAST(?1 AS INTEGER)",
        &[Some(raw_id.as_str())],
    )
    .rows()?;
    if result.is_empty() {
        return Err(LibraryError::not_found("book", raw_id));
    }
    Ok(BookCounts {
        copies_total: result.parse_cell(0, 0)?,
        copies_available: result.parse_cell(0, 1)?,
    })
}

/// Number of open loans for a book.
pub fn active_loan_count(conn: &Connection, book_id: i64) -> LibraryResult<i64> {
    let raw_id = book_id.to_string();
    run(
        conn,
        "SELECT COUNT(*) FROM loans WHERE book_id = CAST(?1 AS INTEGER) AND return_date IS NULL",
        &[Some(raw_id.as_str())],
    )
    .rows()?
    .parse_cell(0, 0)
}

fn find_same_book(conn: &Connection, book: &NewBook) -> LibraryResult<Option<i64>> {
    let fields = natural_key_params(book);
    let result = run(
        conn,
        "SELECT book_id FROM books
         WHERE title = ?1
           AND author_id = CAST(?2 AS INTEGER)
           AND genre_id = CAST(?3 AS INTEGER)
           AND publisher_id = CAST(?4 AS INTEGER)
           AND language_id = CAST(?5 AS INTEGER)
           AND year = CAST(?6 AS INTEGER)
           AND pages = CAST(?7 AS INTEGER)
         ORDER BY book_id
         LIMIT 1",
        &[
            Some(fields[0].as_str()),
            Some(fields[1].as_str()),
            Some(fields[2].as_str()),
            Some(fields[3].as_str()),
            Some(fields[4].as_str()),
            Some(fields[5].as_str()),
            Some(fields[6].as_str()),
        ],
    )
    .rows()?;

    if result.is_empty() {
        Ok(None)
    } else {
        result.parse_cell(0, 0).map(Some)
    }
}

fn natural_key_params(book: &NewBook) -> [String; 7] {
    [
        book.title.clone(),
        book.author_id.to_string(),
        book.genre_id.to_string(),
        book.publisher_id.to_string(),
        book.language_id.to_string(),
        book.year.to_string(),
        book.pages.to_string(),
    ]
}
