//! src/authentication/password.rs

use crate::error::{error_chain_fmt, AuthResult, Error};
use crate::telemetry::spawn_blocking_with_tracing;
use anyhow::Context;
use argon2::{
    password_hash::SaltString, Algorithm, Argon2, Params, PasswordHash, PasswordHasher,
    PasswordVerifier, Version,
};
use secrecy::{ExposeSecret, Secret};
use sqlx::PgPool;
use uuid::Uuid;

type CredsResult<T> = Result<T, CredentialsError>;

#[derive(thiserror::Error)]
pub enum CredentialsError {
    #[error("Username could not be found.")]
    UnknownUsername,
    #[error("Failed to verify password.")]
    FailedVerification(#[from] argon2::password_hash::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for CredentialsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl CredentialsError {
    /// Login deliberately flattens unknown usernames and wrong passwords
    /// into one undifferentiated failure.
    pub fn into_login_error(self) -> Error {
        match self {
            CredentialsError::UnexpectedError(e) => Error::UnexpectedError(e),
            _ => Error::Authorization(AuthorizationError::BadCredentials),
        }
    }

    /// Change-password reports a wrong current password distinctly; the
    /// caller is already authenticated.
    pub fn into_wrong_old_password(self) -> Error {
        match self {
            CredentialsError::UnexpectedError(e) => Error::UnexpectedError(e),
            _ => Error::Authorization(AuthorizationError::WrongOldPassword),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AuthorizationError {
    #[error("Wrong username or password.")]
    BadCredentials,
    #[error("Wrong password.")]
    WrongOldPassword,
}

impl AuthorizationError {
    /// The response field this error is reported under.
    pub fn field(&self) -> &'static str {
        match self {
            AuthorizationError::BadCredentials => "non_field_errors",
            AuthorizationError::WrongOldPassword => "old_password",
        }
    }
}

pub struct Credentials {
    pub username: String,
    pub password: Secret<String>,
}

#[tracing::instrument(name = "Validate credentials", skip(credentials, pool))]
pub async fn validate_credentials(credentials: Credentials, pool: &PgPool) -> CredsResult<Uuid> {
    let mut user_id: Option<Uuid> = None;
    let mut expected_password_hash = Secret::new(
        "$argon2id$v=19$m=15000,t=2,p=1$\
        gZiV/M1gPc22ElAH/Jh1Hw$\
        CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno"
            .to_string(),
    );
    if let Some((stored_user_id, stored_password_hash)) =
        get_stored_credentials(&credentials.username, pool).await?
    {
        user_id = Some(stored_user_id);
        expected_password_hash = stored_password_hash;
    }

    spawn_blocking_with_tracing(move || {
        verify_password_hash(expected_password_hash, credentials.password)
    })
    .await
    .context("Failed to spawn blocking task.")??;
    // user_id is only set to Some, if we found credentials in database
    user_id.ok_or(CredentialsError::UnknownUsername)
}

#[tracing::instrument(
    name = "Verify password hash",
    skip(expected_password_hash, password_candidate)
)]
fn verify_password_hash(
    expected_password_hash: Secret<String>,
    password_candidate: Secret<String>,
) -> CredsResult<()> {
    let expected_password_hash = PasswordHash::new(expected_password_hash.expose_secret())
        .context("Failed to parse hash in PHC string format.")?;
    Argon2::default().verify_password(
        password_candidate.expose_secret().as_bytes(),
        &expected_password_hash,
    )?;
    Ok(())
}

#[tracing::instrument(name = "Get stored credentials", skip(username, pool))]
async fn get_stored_credentials(
    username: &str,
    pool: &PgPool,
) -> CredsResult<Option<(Uuid, Secret<String>)>> {
    let row = sqlx::query_as::<_, (Uuid, String)>(
        r#"
        SELECT user_id, password_hash
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .context("Failed to perform a query to retrieve stored credentials.")?
    .map(|(user_id, password_hash)| (user_id, Secret::new(password_hash)));
    Ok(row)
}

#[tracing::instrument(name = "Change password", skip(password, pool))]
pub async fn change_password_in_db(
    user_id: Uuid,
    password: Secret<String>,
    pool: &PgPool,
) -> AuthResult<()> {
    let password_hash = spawn_blocking_with_tracing(move || compute_password_hash(password))
        .await
        .context("Failed to spawn computation of password hash")?
        .context("Failed to compute the replacement password hash")?;
    sqlx::query(
        r#"
        UPDATE users
        SET password_hash = $1
        WHERE user_id = $2
        "#,
    )
    .bind(password_hash.expose_secret())
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to change user's password in the database.")?;
    Ok(())
}

pub fn compute_password_hash(password: Secret<String>) -> CredsResult<Secret<String>> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(15_000, 2, 1, None).unwrap(),
    )
    .hash_password(password.expose_secret().as_bytes(), &salt)
    .context("Failed to hash password.")?
    .to_string();
    Ok(Secret::new(password_hash))
}
