//! Attribute name validation for configuration tree fields.

use crate::error::ConfigError;

/// Check whether a string is a legal configuration field name.
///
/// Legal names contain only ASCII letters, digits and underscores and must
/// not start with a digit. Empty strings, spaces, dashes and non-ASCII
/// characters are all rejected.
///
/// # Examples
///
/// ```
/// use syskit::config::is_valid_attribute_name;
///
/// assert!(is_valid_attribute_name("test"));
/// assert!(is_valid_attribute_name("test_123"));
/// assert!(!is_valid_attribute_name("a b"));
/// assert!(!is_valid_attribute_name("a-b"));
/// assert!(!is_valid_attribute_name("1abc"));
/// ```
#[must_use]
pub fn is_valid_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate a field name, raising [`ConfigError::InvalidAttributeName`] on
/// violation.
pub(crate) fn validate_attribute_name(name: &str) -> Result<(), ConfigError> {
    if is_valid_attribute_name(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidAttributeName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        for name in ["test", "test123", "_private", "snake_case_name"] {
            assert!(is_valid_attribute_name(name), "{name} should be accepted");
        }
    }

    #[test]
    fn rejects_spaces_and_dashes() {
        for name in ["spaced out", "dashed-string", "a b", "a-b"] {
            assert!(!is_valid_attribute_name(name), "{name} should be rejected");
        }
    }

    #[test]
    fn rejects_leading_digit() {
        assert!(!is_valid_attribute_name("1abc"));
        assert!(!is_valid_attribute_name("9"));
    }

    #[test]
    fn rejects_empty_and_non_ascii() {
        assert!(!is_valid_attribute_name(""));
        assert!(!is_valid_attribute_name("hähää"));
        assert!(!is_valid_attribute_name("名前"));
    }

    #[test]
    fn validate_returns_typed_error() {
        let err = validate_attribute_name("a b");
        assert!(matches!(err, Err(ConfigError::InvalidAttributeName(name)) if name == "a b"));
    }
}
