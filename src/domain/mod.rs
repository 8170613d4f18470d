//! src/domain/mod.rs

mod new_user;
mod session_token;
mod user_email;
mod user_name;

pub use new_user::NewUser;
pub use session_token::SessionToken;
pub use user_email::UserEmail;
pub use user_name::UserName;

/// Validation error for domain data
#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("`{0}` is not a valid username.")]
    InvalidUsername(String),
    #[error("`{0}` is not a valid email address.")]
    InvalidEmail(String),
    #[error("`{0}` is not a valid session token.")]
    InvalidToken(String),
    #[error("An account with this email address already exists.")]
    EmailTaken,
    #[error("A user with that username already exists.")]
    UsernameTaken,
    #[error("The password does not satisfy the password policy.")]
    WeakPassword {
        field: &'static str,
        reasons: Vec<String>,
    },
}

impl ValidationError {
    /// The request field this error is scoped to, with its messages.
    pub fn field_errors(&self) -> (&str, Vec<String>) {
        match self {
            ValidationError::InvalidUsername(_) => ("username", vec![self.to_string()]),
            ValidationError::InvalidEmail(_) => ("email", vec![self.to_string()]),
            ValidationError::InvalidToken(_) => ("token", vec![self.to_string()]),
            ValidationError::EmailTaken => ("email", vec![self.to_string()]),
            ValidationError::UsernameTaken => ("username", vec![self.to_string()]),
            ValidationError::WeakPassword { field, reasons } => (field, reasons.clone()),
        }
    }
}
