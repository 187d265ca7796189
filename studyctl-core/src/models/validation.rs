//! Validation error types

use std::fmt;

/// Validation error for domain models
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format (e.g., language code)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },

    /// Problem properties don't fit the workbook's problem type
    InvalidProperties { problem_type: &'static str, reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
            Self::InvalidProperties {
                problem_type,
                reason,
            } => {
                write!(f, "invalid {} properties: {}", problem_type, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a required text field: non-empty after trimming, at most `max` chars.
pub(crate) fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    optional_text(field, trimmed, max)
}

/// Check an optional text field: at most `max` chars, surrounding whitespace trimmed.
pub(crate) fn optional_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "name",
            max: 40,
        };
        assert_eq!(err.to_string(), "name exceeds maximum length of 40 characters");
    }

    #[test]
    fn required_text_trims() {
        assert_eq!(required_text("text", "  apple ", 10).unwrap(), "apple");
        assert!(matches!(
            required_text("text", "   ", 10),
            Err(ValidationError::Empty { field: "text" })
        ));
    }

    #[test]
    fn length_is_counted_in_chars() {
        // 5 multi-byte chars fit into a limit of 5
        assert!(optional_text("translated", "りんごです", 5).is_ok());
        assert!(optional_text("translated", "りんごですね", 5).is_err());
    }
}
