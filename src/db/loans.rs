//! Loan lifecycle: a loan is open while `return_date` is NULL and closed once
//! it is set. Closed is terminal. Opening and closing a loan move one copy
//! between the shelf and the reader, inside a single immediate transaction.

use rusqlite::{Connection, TransactionBehavior};
use tracing::{info, warn};

use crate::db::executor::{run, QueryResult};
use crate::db::inventory::book_counts;
use crate::db::resolver::{exists, READERS};
use crate::error::{LibraryError, LibraryResult};
use crate::models::{ClosedLoan, OpenedLoan};
use crate::validation::{parse_date, DATE_FORMAT};

/// Lend one copy of `book_id` to `reader_id`. An empty `loan_date` means
/// today.
pub fn open_loan(
    conn: &mut Connection,
    book_id: i64,
    reader_id: i64,
    loan_date: &str,
) -> LibraryResult<OpenedLoan> {
    let loan_date = parse_date(loan_date, "Loan date")?
        .format(DATE_FORMAT)
        .to_string();

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let counts = book_counts(&tx, book_id)?;
    if !exists(&tx, READERS, reader_id)? {
        return Err(LibraryError::not_found("reader", reader_id.to_string()));
    }
    if counts.copies_available <= 0 {
        warn!(book_id, reader_id, "no copies left to lend");
        return Err(LibraryError::NoCopiesAvailable { book_id });
    }

    let raw_book = book_id.to_string();
    let raw_reader = reader_id.to_string();
    run(
        &tx,
        "INSERT INTO loans (book_id, reader_id, loan_date)
         VALUES (CAST(?1 AS INTEGER), CAST(?2 AS INTEGER), ?3)",
        &[
            Some(raw_book.as_str()),
            Some(raw_reader.as_str()),
            Some(loan_date.as_str()),
        ],
    )
    .affected()?;
    let loan_id = tx.last_insert_rowid();

    run(
        &tx,
        "UPDATE books SET copies_available = copies_available - 1
         WHERE book_id = CAST(?1 AS INTEGER)",
        &[Some(raw_book.as_str())],
    )
    .affected()?;

    tx.commit()?;
    let opened = OpenedLoan {
        loan_id,
        book_id,
        copies_available: counts.copies_available - 1,
    };
    info!(?opened, reader_id, %loan_date, "loan opened");
    Ok(opened)
}

/// Close an open loan and put the copy back on the shelf, never raising the
/// available count above the total.
pub fn close_loan(
    conn: &mut Connection,
    loan_id: i64,
    return_date: &str,
) -> LibraryResult<ClosedLoan> {
    let returned_on = parse_date(return_date, "Return date")?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let raw_loan = loan_id.to_string();
    let open = run(
        &tx,
        "SELECT book_id, loan_date FROM loans
         WHERE loan_id = CAST(?1 AS INTEGER) AND return_date IS NULL",
        &[Some(raw_loan.as_str())],
    )
    .rows()?;
    if open.is_empty() {
        warn!(loan_id, "no open loan to close");
        return Err(LibraryError::NoActiveLoan { loan_id });
    }
    let book_id: i64 = open.parse_cell(0, 0)?;
    let loaned_on = parse_date(open.cell(0, 1).unwrap_or_default(), "Loan date")?;
    if returned_on < loaned_on {
        return Err(LibraryError::validation(format!(
            "Return date {returned_on} is before the loan date {loaned_on}."
        )));
    }

    let raw_date = returned_on.format(DATE_FORMAT).to_string();
    run(
        &tx,
        "UPDATE loans SET return_date = ?1 WHERE loan_id = CAST(?2 AS INTEGER)",
        &[Some(raw_date.as_str()), Some(raw_loan.as_str())],
    )
    .affected()?;

    let raw_book = book_id.to_string();
    run(
        &tx,
        "UPDATE books
         SET copies_available = MIN(copies_available + 1, copies_total)
         WHERE book_id = CAST(?1 AS INTEGER)",
        &[Some(raw_book.as_str())],
    )
    .affected()?;
    let counts = book_counts(&tx, book_id)?;

    tx.commit()?;
    let closed = ClosedLoan {
        loan_id,
        book_id,
        copies_available: counts.copies_available,
    };
    info!(?closed, return_date = %raw_date, "loan closed");
    Ok(closed)
}

/// Every open loan with the reader's name and the book title.
pub fn active_loans(conn: &Connection) -> LibraryResult<QueryResult> {
    run(
        conn,
        "SELECT l.loan_id, r.full_name, b.title, l.loan_date
         FROM loans l
         JOIN readers r ON l.reader_id = r.reader_id
         JOIN books b   ON l.book_id = b.book_id
         WHERE l.return_date IS NULL
         ORDER BY l.loan_id",
        &[],
    )
    .rows()
}
