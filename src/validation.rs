//! Parsing of the raw strings collected by the terminal forms. The UI only
//! trims; every numeric, date and required-field check happens here.

use chrono::{Local, NaiveDate};

use crate::error::{LibraryError, LibraryResult};

/// Date format accepted for loan and return dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// True when the input is non-empty and made only of ASCII digits.
pub fn is_number(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

/// Return the trimmed text or a validation error naming the field.
pub fn require_text(raw: &str, field: &str) -> LibraryResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LibraryError::validation(format!("{field} is required.")));
    }
    Ok(trimmed.to_string())
}

/// Blank optional fields are stored as NULL.
pub fn optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn parse_non_negative(raw: &str, field: &str) -> LibraryResult<i64> {
    let trimmed = raw.trim();
    if !is_number(trimmed) {
        return Err(LibraryError::validation(format!(
            "{field} must be a whole number."
        )));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| LibraryError::validation(format!("{field} is out of range.")))
}

pub fn parse_positive(raw: &str, field: &str) -> LibraryResult<i64> {
    let value = parse_non_negative(raw, field)?;
    if value == 0 {
        return Err(LibraryError::validation(format!(
            "{field} must be greater than zero."
        )));
    }
    Ok(value)
}

/// Parse a record id typed by the operator. Ids start at 1.
pub fn parse_id(raw: &str, entity: &str) -> LibraryResult<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LibraryError::EmptyInput);
    }
    if !is_number(trimmed) {
        return Err(LibraryError::validation(format!(
            "The {entity} id must be a number."
        )));
    }
    // Digits that overflow i64 cannot name an existing row.
    trimmed
        .parse::<i64>()
        .map_err(|_| LibraryError::not_found(entity, trimmed))
}

/// Parse a `YYYY-MM-DD` date; an empty field means today.
pub fn parse_date(raw: &str, field: &str) -> LibraryResult<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Local::now().date_naive());
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| {
        LibraryError::validation(format!("{field} must be a date in YYYY-MM-DD format."))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_ascii_digits_only() {
        assert!(is_number("0042"));
        assert!(!is_number(""));
        assert!(!is_number("-3"));
        assert!(!is_number("٣"));
        assert!(!is_number("12a"));
    }

    #[test]
    fn positive_rejects_zero_and_text() {
        assert_eq!(parse_positive(" 5 ", "Copies").unwrap(), 5);
        assert!(parse_positive("0", "Copies").is_err());
        assert!(parse_positive("five", "Copies").is_err());
    }

    #[test]
    fn huge_ids_are_not_found() {
        let err = parse_id("99999999999999999999", "book").unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { .. }));
        assert!(matches!(parse_id("", "book"), Err(LibraryError::EmptyInput)));
    }

    #[test]
    fn dates_use_iso_format() {
        let date = parse_date("2024-03-01", "Loan date").unwrap();
        assert_eq!(date.to_string(), "2024-03-01");
        assert!(parse_date("01.03.2024", "Loan date").is_err());
        assert!(parse_date("", "Loan date").is_ok());
    }

    #[test]
    fn optional_text_maps_blank_to_none() {
        assert_eq!(optional_text("  "), None);
        assert_eq!(optional_text(" Paris "), Some("Paris".to_string()));
    }
}
