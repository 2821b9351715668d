//! Domain values passed between the persistence layer and the TUI. Rows stay
//! in SQLite; these types only describe what goes in and what an operation
//! reports back.

use std::fmt;

use crate::error::{LibraryError, LibraryResult};
use crate::validation::{parse_non_negative, parse_positive, require_text};

/// Raw book form input with the four reference ids already resolved.
#[derive(Debug, Clone, Default)]
pub struct BookDraft {
    pub title: String,
    pub author_id: i64,
    pub genre_id: i64,
    pub publisher_id: i64,
    pub language_id: i64,
    pub year: String,
    pub pages: String,
    pub copies: String,
}

impl BookDraft {
    /// Check the free-text fields and turn them into a typed book plus the
    /// number of copies being added.
    pub fn validate(&self) -> LibraryResult<(NewBook, i64)> {
        let title = require_text(&self.title, "Title")?;
        let year = parse_non_negative(&self.year, "Year")?;
        let pages = parse_non_negative(&self.pages, "Pages")?;
        let copies = parse_positive(&self.copies, "Number of copies")?;
        Ok((
            NewBook {
                title,
                author_id: self.author_id,
                genre_id: self.genre_id,
                publisher_id: self.publisher_id,
                language_id: self.language_id,
                year,
                pages,
            },
            copies,
        ))
    }
}

/// The natural key of a book. Two adds with equal values describe the same
/// catalog entry and are merged into one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author_id: i64,
    pub genre_id: i64,
    pub publisher_id: i64,
    pub language_id: i64,
    pub year: i64,
    pub pages: i64,
}

/// Result of `add_or_merge_book`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookStored {
    Inserted {
        book_id: i64,
        copies: i64,
    },
    Merged {
        book_id: i64,
        copies_total: i64,
        copies_available: i64,
    },
}

impl fmt::Display for BookStored {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookStored::Inserted { book_id, copies } => {
                write!(f, "Added book {book_id} with {copies} copies.")
            }
            BookStored::Merged {
                book_id,
                copies_total,
                copies_available,
            } => write!(
                f,
                "Book {book_id} already existed: now {copies_available} of {copies_total} copies available."
            ),
        }
    }
}

/// Result of `delete_copies`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopiesRemoved {
    BookDeleted {
        book_id: i64,
    },
    Reduced {
        book_id: i64,
        copies_total: i64,
        copies_available: i64,
    },
}

impl fmt::Display for CopiesRemoved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopiesRemoved::BookDeleted { book_id } => {
                write!(f, "Book {book_id} removed from the catalog.")
            }
            CopiesRemoved::Reduced {
                book_id,
                copies_total,
                copies_available,
            } => write!(
                f,
                "Book {book_id} now has {copies_total} copies ({copies_available} available)."
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedLoan {
    pub loan_id: i64,
    pub book_id: i64,
    pub copies_available: i64,
}

impl fmt::Display for OpenedLoan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loan {} opened for book {}; {} copies left.",
            self.loan_id, self.book_id, self.copies_available
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedLoan {
    pub loan_id: i64,
    pub book_id: i64,
    pub copies_available: i64,
}

impl fmt::Display for ClosedLoan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loan {} closed; book {} has {} copies available.",
            self.loan_id, self.book_id, self.copies_available
        )
    }
}

/// Comparison used by the year and page-count filters. Only these three
/// operators ever reach statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Less,
    Greater,
    Equal,
}

impl Comparison {
    pub fn parse(raw: &str) -> LibraryResult<Self> {
        match raw.trim() {
            "<" => Ok(Comparison::Less),
            ">" => Ok(Comparison::Greater),
            "=" => Ok(Comparison::Equal),
            _ => Err(LibraryError::validation(
                "Operator must be one of <, > or =.",
            )),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Comparison::Less => "<",
            Comparison::Greater => ">",
            Comparison::Equal => "=",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> BookDraft {
        BookDraft {
            title: "  The Hobbit ".into(),
            author_id: 1,
            genre_id: 2,
            publisher_id: 3,
            language_id: 4,
            year: "1937".into(),
            pages: "310".into(),
            copies: "3".into(),
        }
    }

    #[test]
    fn draft_validates_into_trimmed_book() {
        let (book, copies) = draft().validate().unwrap();
        assert_eq!(book.title, "The Hobbit");
        assert_eq!(book.year, 1937);
        assert_eq!(copies, 3);
    }

    #[test]
    fn draft_rejects_zero_copies() {
        let mut draft = draft();
        draft.copies = "0".into();
        assert!(matches!(draft.validate(), Err(LibraryError::Validation(_))));
    }

    #[test]
    fn draft_rejects_blank_title() {
        let mut draft = draft();
        draft.title = "   ".into();
        assert!(draft.validate().is_err());
    }

    #[test]
    fn comparison_only_accepts_three_operators() {
        assert_eq!(Comparison::parse(" < ").unwrap(), Comparison::Less);
        assert_eq!(Comparison::parse("=").unwrap().as_sql(), "=");
        assert!(Comparison::parse("<=").is_err());
        assert!(Comparison::parse("; DROP TABLE books").is_err());
    }
}
