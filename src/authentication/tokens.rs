//! src/authentication/tokens.rs

use crate::domain::SessionToken;
use crate::error::AuthResult;
use anyhow::Context;
use chrono::Utc;
use sqlx::{Executor, PgPool, Postgres, Transaction};
use uuid::Uuid;

pub type PgTransaction = Transaction<'static, Postgres>;

/// Issue a fresh session token bound to `user_id` and persist it.
#[tracing::instrument(name = "Issue session token", skip(pool))]
pub async fn issue_token(pool: &PgPool, user_id: Uuid) -> AuthResult<SessionToken> {
    let session_token = SessionToken::generate();
    sqlx::query(
        r#"INSERT INTO session_tokens (token_value, user_id, issued_at)
        VALUES ($1, $2, $3)"#,
    )
    .bind(session_token.as_ref())
    .bind(user_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to store a new session token in the database.")?;
    Ok(session_token)
}

/// Persist `session_token` as part of an enclosing transaction.
#[tracing::instrument(name = "Store session token", skip(session_token, transaction))]
pub async fn store_token(
    transaction: &mut PgTransaction,
    user_id: Uuid,
    session_token: &SessionToken,
) -> AuthResult<()> {
    let query = sqlx::query(
        r#"INSERT INTO session_tokens (token_value, user_id, issued_at)
        VALUES ($1, $2, $3)"#,
    )
    .bind(session_token.as_ref())
    .bind(user_id)
    .bind(Utc::now());
    transaction
        .execute(query)
        .await
        .context("Failed to store the session token for a new user.")?;
    Ok(())
}

/// Resolve an active token to its owner, if any.
#[tracing::instrument(name = "Resolve session token", skip(pool, session_token))]
pub async fn resolve_token(
    pool: &PgPool,
    session_token: &SessionToken,
) -> AuthResult<Option<Uuid>> {
    let user_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT user_id FROM session_tokens
        WHERE token_value = $1",
    )
    .bind(session_token.as_ref())
    .fetch_optional(pool)
    .await
    .context("Failed to read the owner of a session token from the database.")?;
    Ok(user_id)
}

/// Revoke a single token. Revoking an unknown token is a no-op.
#[tracing::instrument(name = "Revoke session token", skip(pool, session_token))]
pub async fn revoke_token(pool: &PgPool, session_token: &SessionToken) -> AuthResult<()> {
    sqlx::query(
        r#"
        DELETE FROM session_tokens
        WHERE token_value = $1
        "#,
    )
    .bind(session_token.as_ref())
    .execute(pool)
    .await
    .context("Failed to execute query to revoke a session token")?;
    Ok(())
}

/// Revoke every token owned by `user_id` in a single atomic statement.
#[tracing::instrument(name = "Revoke all session tokens of user", skip(pool))]
pub async fn revoke_all_tokens(pool: &PgPool, user_id: Uuid) -> AuthResult<()> {
    sqlx::query(
        r#"
        DELETE FROM session_tokens
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to execute query to revoke all session tokens of a user")?;
    Ok(())
}
