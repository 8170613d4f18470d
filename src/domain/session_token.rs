//! src/domain/session_token.rs

use crate::domain::ValidationError;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

/// Length of a token value in characters. 48 case-sensitive alphanumerics
/// carry ~285 bits of entropy, far beyond guessability.
const TOKEN_LENGTH: usize = 48;

#[derive(Clone, Debug)]
pub struct SessionToken {
    token_value: String,
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        &self.token_value
    }
}

impl SessionToken {
    /// Generate a random 48-characters-long case-sensitive session token.
    pub fn generate() -> Self {
        let mut rng = thread_rng();
        Self {
            token_value: std::iter::repeat_with(|| rng.sample(Alphanumeric))
                .map(char::from)
                .take(TOKEN_LENGTH)
                .collect(),
        }
    }

    /// check if any char of token_value is not alphanumeric
    pub fn is_valid(&self) -> Result<&str, ValidationError> {
        if self.token_value.chars().any(|c| !c.is_alphanumeric())
            || self.token_value.chars().count() != TOKEN_LENGTH
        {
            Err(ValidationError::InvalidToken(self.token_value.to_owned()))
        } else {
            Ok(&self.token_value)
        }
    }

    /// parse string as token
    pub fn parse(s: String) -> Result<SessionToken, ValidationError> {
        let session_token = Self { token_value: s };
        session_token.is_valid()?;
        Ok(session_token)
    }
}
