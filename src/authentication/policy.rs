//! src/authentication/policy.rs

use secrecy::{ExposeSecret, Secret};
use std::collections::HashSet;

const COMMON_PASSWORDS: &str = include_str!("common_passwords.txt");

/// User attributes and password candidates shorter than this do not
/// participate in the similarity check.
const MIN_SIMILARITY_LENGTH: usize = 4;

/// Configurable strength rules a new or changed password must satisfy.
pub struct PasswordPolicy {
    min_length: usize,
    common_passwords: HashSet<&'static str>,
}

impl PasswordPolicy {
    pub fn new(min_length: usize) -> Self {
        Self {
            min_length,
            common_passwords: COMMON_PASSWORDS
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect(),
        }
    }

    /// Check `password` against every rule. All violated rules are
    /// reported, one message each.
    pub fn validate(
        &self,
        password: &Secret<String>,
        username: &str,
        email: &str,
    ) -> Result<(), Vec<String>> {
        let password = password.expose_secret();
        let mut reasons = Vec::new();
        if password.chars().count() < self.min_length {
            reasons.push(format!(
                "This password is too short. It must contain at least {} characters.",
                self.min_length
            ));
        }
        if self
            .common_passwords
            .contains(password.to_lowercase().as_str())
        {
            reasons.push("This password is too common.".to_string());
        }
        if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
            reasons.push("This password is entirely numeric.".to_string());
        }
        if is_too_similar(password, username) {
            reasons.push("The password is too similar to the username.".to_string());
        }
        let local_part = email.rsplit_once('@').map(|(local, _)| local).unwrap_or(email);
        if is_too_similar(password, email) || is_too_similar(password, local_part) {
            reasons.push("The password is too similar to the email address.".to_string());
        }
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(reasons)
        }
    }
}

/// Case-insensitive containment in either direction.
fn is_too_similar(password: &str, attribute: &str) -> bool {
    if password.chars().count() < MIN_SIMILARITY_LENGTH
        || attribute.chars().count() < MIN_SIMILARITY_LENGTH
    {
        return false;
    }
    let password = password.to_lowercase();
    let attribute = attribute.to_lowercase();
    password.contains(&attribute) || attribute.contains(&password)
}
