//! Error types shared by every library operation.
//!
//! The variants follow the way the terminal reports problems to the operator:
//! each one renders as a complete sentence that can go straight into the
//! footer, while [`LibraryError::category`] tells the UI (and the log) which
//! class of failure it is looking at.

use thiserror::Error;

/// Broad failure classes. Every class aborts the current operation and hands
/// control back to the menu, except `Connection`, which is fatal at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Connection,
    Query,
    Validation,
    NotFound,
    BusinessRule,
}

#[derive(Debug, Error)]
pub enum LibraryError {
    /// The database file could not be opened or prepared.
    #[error("Could not open the library database: {0}")]
    ConnectionFailure(String),

    /// SQLite rejected a statement. The message is the engine's own text.
    #[error("Database error: {0}")]
    QueryFailure(String),

    /// Malformed input such as a non-numeric year or a missing title.
    #[error("{0}")]
    Validation(String),

    #[error("Input must not be empty.")]
    EmptyInput,

    /// The follow-up answer to a disambiguation prompt was not a number.
    #[error("Invalid choice: enter one of the listed numeric ids.")]
    InvalidChoice,

    #[error("No {entity} found for '{query}'.")]
    NotFound { entity: String, query: String },

    #[error("Cannot remove {requested} copies: only {available} are on the shelf right now.")]
    InsufficientAvailable { requested: i64, available: i64 },

    #[error(
        "Cannot remove {requested} copies: {remaining} would remain while {active_loans} are on loan."
    )]
    WouldViolateLoanInvariant {
        requested: i64,
        remaining: i64,
        active_loans: i64,
    },

    #[error("Cannot lend book {book_id}: no copies available.")]
    NoCopiesAvailable { book_id: i64 },

    #[error("No active loan with id {loan_id} (it may already be returned).")]
    NoActiveLoan { loan_id: i64 },
}

impl LibraryError {
    pub fn not_found(entity: impl Into<String>, query: impl Into<String>) -> Self {
        LibraryError::NotFound {
            entity: entity.into(),
            query: query.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        LibraryError::Validation(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            LibraryError::ConnectionFailure(_) => ErrorCategory::Connection,
            LibraryError::QueryFailure(_) => ErrorCategory::Query,
            LibraryError::Validation(_)
            | LibraryError::EmptyInput
            | LibraryError::InvalidChoice => ErrorCategory::Validation,
            LibraryError::NotFound { .. } => ErrorCategory::NotFound,
            LibraryError::InsufficientAvailable { .. }
            | LibraryError::WouldViolateLoanInvariant { .. }
            | LibraryError::NoCopiesAvailable { .. }
            | LibraryError::NoActiveLoan { .. } => ErrorCategory::BusinessRule,
        }
    }
}

impl From<rusqlite::Error> for LibraryError {
    fn from(err: rusqlite::Error) -> Self {
        LibraryError::QueryFailure(err.to_string())
    }
}

pub type LibraryResult<T> = Result<T, LibraryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rules_are_categorized() {
        let err = LibraryError::NoActiveLoan { loan_id: 4 };
        assert_eq!(err.category(), ErrorCategory::BusinessRule);
        assert!(err.to_string().contains("4"));
    }

    #[test]
    fn sqlite_errors_become_query_failures() {
        let err: LibraryError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.category(), ErrorCategory::Query);
    }

    #[test]
    fn not_found_names_the_entity() {
        let err = LibraryError::not_found("author", "Tol");
        assert_eq!(err.to_string(), "No author found for 'Tol'.");
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }
}
