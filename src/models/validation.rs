//! Contact field validation.

use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

static PHONE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s\-\(\)]{7,}$").ok());

/// Returns true for a plausible email address.
///
/// ```
/// use hr_engine::models::validate_email;
///
/// assert!(validate_email("jane.doe@example.com"));
/// assert!(!validate_email("jane.doe@example"));
/// ```
pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

/// Returns true for a phone number of at least seven digits, spaces,
/// dashes or parentheses, with an optional leading `+`.
pub fn validate_phone(phone: &str) -> bool {
    PHONE_RE.as_ref().is_some_and(|re| re.is_match(phone))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("a@b.co"));
        assert!(validate_email("first.last+tag@sub.example.org"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!validate_email(""));
        assert!(!validate_email("no-at-sign.com"));
        assert!(!validate_email("x@y.c"));
        assert!(!validate_email("spaces in@example.com"));
    }

    #[test]
    fn test_valid_phones() {
        assert!(validate_phone("+1 (555) 010-0100"));
        assert!(validate_phone("0123456"));
    }

    #[test]
    fn test_invalid_phones() {
        assert!(!validate_phone("12345"));
        assert!(!validate_phone("555-CALL-NOW"));
    }
}
