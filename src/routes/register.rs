//! src/routes/register.rs

use actix_web::{web, HttpResponse};
use anyhow::Context;
use chrono::Utc;
use secrecy::{ExposeSecret, Secret};
use sqlx::{Executor, PgPool};
use uuid::Uuid;

use crate::authentication::{compute_password_hash, store_token, PasswordPolicy, PgTransaction};
use crate::domain::{NewUser, SessionToken, UserEmail, UserName, ValidationError};
use crate::error::{AuthResult, Error};
use crate::routes::TokenResponse;
use crate::telemetry::spawn_blocking_with_tracing;

#[derive(serde::Deserialize)]
pub struct RegisterData {
    username: String,
    email: String,
    password: Secret<String>,
}

/// Checks if err results from a unique violation on the users table, and on
/// which of the two identity columns.
fn duplicate_identity_error(err: &Error) -> Option<ValidationError> {
    let Error::UnexpectedError(source) = err else {
        return None;
    };
    let sqlx::Error::Database(db_err) = source.downcast_ref::<sqlx::Error>()? else {
        return None;
    };
    if !db_err.is_unique_violation() {
        return None;
    }
    match db_err.constraint() {
        Some("users_email_key") => Some(ValidationError::EmailTaken),
        Some("users_username_key") => Some(ValidationError::UsernameTaken),
        _ => None,
    }
}

#[tracing::instrument(
    name = "Registering a new user.",
    skip(payload, pool, policy),
    fields(
        username = %payload.username,
        email = %payload.email
    )
)]
pub async fn register(
    payload: web::Json<RegisterData>,
    pool: web::Data<PgPool>,
    policy: web::Data<PasswordPolicy>,
) -> AuthResult<HttpResponse> {
    let RegisterData {
        username,
        email,
        password,
    } = payload.into_inner();
    let new_user = NewUser {
        username: UserName::parse(username)?,
        email: UserEmail::parse(email)?,
    };
    policy
        .validate(&password, new_user.username.as_ref(), new_user.email.as_ref())
        .map_err(|reasons| ValidationError::WeakPassword {
            field: "password",
            reasons,
        })?;
    // Early duplicate check for a precise error without burning a password
    // hash; the unique constraint below remains the source of truth.
    if email_exists(&pool, new_user.email.as_ref()).await? {
        return Err(ValidationError::EmailTaken.into());
    }
    let password_hash = spawn_blocking_with_tracing(move || compute_password_hash(password))
        .await
        .context("Failed to spawn computation of password hash")?
        .context("Failed to hash the password of a new user")?;
    let session_token = match register_transaction(&pool, &new_user, password_hash).await {
        Ok(session_token) => session_token,
        Err(err) => {
            return match duplicate_identity_error(&err) {
                Some(validation_error) => Err(validation_error.into()),
                None => Err(err),
            };
        }
    };
    Ok(HttpResponse::Created().json(TokenResponse {
        token: session_token.as_ref().to_owned(),
    }))
}

#[tracing::instrument(name = "Check for an existing account with this email", skip_all)]
async fn email_exists(pool: &PgPool, email: &str) -> AuthResult<bool> {
    let existing = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to check for an existing account with this email address.")?;
    Ok(existing.is_some())
}

#[tracing::instrument(
    name = "Executing the transaction to insert a new user in the database.",
    skip(new_user, password_hash, pool)
)]
async fn register_transaction(
    pool: &PgPool,
    new_user: &NewUser,
    password_hash: Secret<String>,
) -> AuthResult<SessionToken> {
    // init transaction
    let mut transaction: PgTransaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;
    // insert user in transaction
    let user_id = insert_user(&mut transaction, new_user, password_hash).await?;
    // insert token in transaction
    let session_token = SessionToken::generate();
    store_token(&mut transaction, user_id, &session_token).await?;
    // commit transaction
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to store a new user.")?;
    Ok(session_token)
}

#[tracing::instrument(
    name = "Saving new user details in the database.",
    skip(new_user, password_hash, transaction)
)]
async fn insert_user(
    transaction: &mut PgTransaction,
    new_user: &NewUser,
    password_hash: Secret<String>,
) -> AuthResult<Uuid> {
    let user_id = Uuid::new_v4();
    let query = sqlx::query(
        r#"INSERT INTO users (user_id, username, email, password_hash, joined_at)
        VALUES ($1, $2, $3, $4, $5)"#,
    )
    .bind(user_id)
    .bind(new_user.username.as_ref())
    .bind(new_user.email.as_ref())
    .bind(password_hash.expose_secret().to_owned())
    .bind(Utc::now());
    transaction
        .execute(query)
        .await
        .context("Failed to insert new user in the database.")?;
    Ok(user_id)
}
