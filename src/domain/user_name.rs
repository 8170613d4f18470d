//! src/domain/user_name.rs

use crate::domain::ValidationError;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug)]
pub struct UserName(String);

impl UserName {
    /// Returns an instance of `UserName` if the input satisfies all
    /// our validation constraints on usernames, `ValidationError` otherwise.
    ///
    /// Usernames are at most 150 graphemes and limited to letters, digits
    /// and `@`, `.`, `+`, `-`, `_`.
    pub fn parse(s: String) -> Result<UserName, ValidationError> {
        let is_empty_or_whitespace = s.trim().is_empty();
        let is_too_long = s.graphemes(true).count() > 150;
        let contains_forbidden_characters = s
            .chars()
            .any(|c| !(c.is_alphanumeric() || ['@', '.', '+', '-', '_'].contains(&c)));

        if is_empty_or_whitespace || is_too_long || contains_forbidden_characters {
            Err(ValidationError::InvalidUsername(s))
        } else {
            Ok(Self(s))
        }
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
