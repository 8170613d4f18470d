//! src/authentication/mod.rs

mod middleware;
mod password;
mod policy;
mod tokens;

pub use middleware::{reject_anonymous_users, TokenAuthError, UserId};
pub use password::{
    change_password_in_db, compute_password_hash, validate_credentials, AuthorizationError,
    Credentials, CredentialsError,
};
pub use policy::PasswordPolicy;
pub use tokens::{
    issue_token, resolve_token, revoke_all_tokens, revoke_token, store_token, PgTransaction,
};
