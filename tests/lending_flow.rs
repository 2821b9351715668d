use library_console::db::{
    add_author, add_genre, add_language, add_or_merge_book, add_publisher, add_reader,
    book_counts, choose, close_loan, delete_copies, list_books, open_loan, resolve,
    resolver::AUTHORS, Resolution,
};
use library_console::models::{BookDraft, BookStored, CopiesRemoved};
use library_console::{open_database, LibraryError};
use rusqlite::Connection;
use tempfile::TempDir;

fn library() -> (TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_database(&dir.path().join("library.sqlite")).unwrap();
    (dir, conn)
}

fn seed(conn: &Connection) {
    add_author(conn, "J. R. R. Tolkien", "UK").unwrap();
    add_genre(conn, "Fantasy").unwrap();
    add_publisher(conn, "Allen & Unwin", "London").unwrap();
    add_language(conn, "English").unwrap();
}

fn hobbit(copies: &str) -> BookDraft {
    BookDraft {
        title: "The Hobbit".into(),
        author_id: 1,
        genre_id: 1,
        publisher_id: 1,
        language_id: 1,
        year: "1937".into(),
        pages: "310".into(),
        copies: copies.into(),
    }
}

#[test]
fn copies_follow_loans_end_to_end() {
    let (_dir, mut conn) = library();
    seed(&conn);
    for name in ["Reader One", "Reader Two", "Reader Three"] {
        add_reader(&conn, name, "", "").unwrap();
    }

    let book_id = match add_or_merge_book(&mut conn, &hobbit("2")).unwrap() {
        BookStored::Inserted { book_id, copies } => {
            assert_eq!(copies, 2);
            book_id
        }
        other => panic!("expected a new book, got {other:?}"),
    };

    let first = open_loan(&mut conn, book_id, 1, "2024-03-01").unwrap();
    assert_eq!(first.copies_available, 1);
    let second = open_loan(&mut conn, book_id, 2, "2024-03-02").unwrap();
    assert_eq!(second.copies_available, 0);

    let err = open_loan(&mut conn, book_id, 3, "2024-03-03").unwrap_err();
    assert!(matches!(err, LibraryError::NoCopiesAvailable { .. }));
    assert_eq!(book_counts(&conn, book_id).unwrap().copies_available, 0);

    let closed = close_loan(&mut conn, first.loan_id, "2024-03-10").unwrap();
    assert_eq!(closed.copies_available, 1);

    let err = close_loan(&mut conn, first.loan_id, "2024-03-11").unwrap_err();
    assert!(matches!(err, LibraryError::NoActiveLoan { .. }));
}

#[test]
fn identical_adds_merge_and_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("library.sqlite");
    {
        let mut conn = open_database(&path).unwrap();
        seed(&conn);
        add_or_merge_book(&mut conn, &hobbit("3")).unwrap();
        let merged = add_or_merge_book(&mut conn, &hobbit("2")).unwrap();
        assert_eq!(
            merged,
            BookStored::Merged {
                book_id: 1,
                copies_total: 5,
                copies_available: 5,
            }
        );
    }

    let conn = open_database(&path).unwrap();
    let books = list_books(&conn).unwrap();
    assert_eq!(books.len(), 1);
    let counts = book_counts(&conn, 1).unwrap();
    assert_eq!((counts.copies_total, counts.copies_available), (5, 5));
}

#[test]
fn deleting_copies_respects_loans() {
    let (_dir, mut conn) = library();
    seed(&conn);
    add_reader(&conn, "Reader One", "", "").unwrap();
    add_or_merge_book(&mut conn, &hobbit("3")).unwrap();
    open_loan(&mut conn, 1, 1, "").unwrap();

    let err = delete_copies(&mut conn, 1, 3).unwrap_err();
    assert!(matches!(
        err,
        LibraryError::InsufficientAvailable {
            requested: 3,
            available: 2
        }
    ));

    let removed = delete_copies(&mut conn, 1, 2).unwrap();
    assert_eq!(
        removed,
        CopiesRemoved::Reduced {
            book_id: 1,
            copies_total: 1,
            copies_available: 0,
        }
    );
}

#[test]
fn resolver_prefers_ids_then_unique_names() {
    let (_dir, conn) = library();
    for name in ["Tolkien", "Anna Karenina Fan", "Joan Didion", "Ian Banks"] {
        add_author(&conn, name, "").unwrap();
    }

    assert_eq!(resolve(&conn, AUTHORS, "3").unwrap(), Resolution::Resolved(3));
    assert_eq!(resolve(&conn, AUTHORS, "Tol").unwrap(), Resolution::Resolved(1));

    let pending = match resolve(&conn, AUTHORS, "an").unwrap() {
        Resolution::Ambiguous(pending) => pending,
        other => panic!("expected several matches, got {other:?}"),
    };
    assert_eq!(pending.ids, vec![2, 3, 4]);

    assert!(matches!(
        choose(&conn, &pending, "four"),
        Err(LibraryError::InvalidChoice)
    ));
    assert!(matches!(
        choose(&conn, &pending, "1"),
        Err(LibraryError::NotFound { .. })
    ));
    assert_eq!(choose(&conn, &pending, "4").unwrap(), 4);

    assert!(matches!(
        resolve(&conn, AUTHORS, "99"),
        Err(LibraryError::NotFound { .. })
    ));
}
