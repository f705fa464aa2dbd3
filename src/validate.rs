//! Field validation and sanitization for user-writable input.
//!
//! Every string a user submits passes through [`validate_field`] before it is
//! allowed anywhere near the store. The SQL keyword check is a plain substring
//! match and therefore rejects legitimate words that happen to contain a
//! keyword ("dropbox", "unions"). That is a known, accepted limitation: the
//! real injection defense is sqlx's parameterized-query boundary, and this
//! filter is a UX-level rejection on top of it.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// Reserved tokens rejected anywhere in an upper-cased field value.
const SQL_KEYWORDS: [&str; 11] = [
    "SELECT", "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "UNION", "--", "/*", "*/",
];

lazy_static! {
    static ref HTML_TAG_RE: Regex = Regex::new(r"<[^>]+>").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate and clean a single submitted field.
///
/// Applies, in order: trim, required/length check against `[min, max]`
/// (counted in characters), SQL keyword rejection, HTML tag rejection, and
/// finally an `ammonia` pass that neutralizes any markup the tag regex did
/// not catch. Returns the cleaned value on success.
pub fn validate_field(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<String, ValidationError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::new(field, "This field is required."));
    }
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::new(
            field,
            format!("Field must be between {min} and {max} characters long."),
        ));
    }

    let upper = value.to_uppercase();
    if SQL_KEYWORDS.iter().any(|kw| upper.contains(kw)) {
        return Err(ValidationError::new(
            field,
            "Invalid input - SQL keywords detected!",
        ));
    }
    if HTML_TAG_RE.is_match(value) {
        return Err(ValidationError::new(field, "HTML tags not allowed!"));
    }

    Ok(ammonia::clean(value))
}
