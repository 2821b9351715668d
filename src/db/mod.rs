//! Persistence module split across logical submodules.

mod catalog;
mod connection;
pub mod executor;
mod inventory;
mod loans;
mod readers;
mod reports;
pub mod resolver;

pub use catalog::{
    add_author, add_genre, add_language, add_publisher, list_authors, list_genres,
    list_languages, list_publishers,
};
pub use connection::{open_database, open_in_memory};
pub use executor::{run, QueryOutcome, QueryResult};
pub use inventory::{active_loan_count, add_or_merge_book, book_counts, delete_copies, BookCounts};
pub use loans::{active_loans, close_loan, open_loan};
pub use readers::{add_reader, list_readers, reader_loans};
pub use reports::{
    available_books, books_by_author, books_by_genre, books_by_pages, books_by_publisher,
    books_by_year, list_books,
};
pub use resolver::{choose, resolve, Disambiguation, Lookup, Resolution};
