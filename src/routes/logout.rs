//! src/routes/logout.rs

use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::authentication::{revoke_all_tokens, revoke_token, UserId};
use crate::domain::SessionToken;
use crate::error::AuthResult;

/// Revoke exactly the token the request authenticated with.
pub async fn log_out(
    session_token: web::ReqData<SessionToken>,
    pool: web::Data<PgPool>,
) -> AuthResult<HttpResponse> {
    revoke_token(&pool, &session_token.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Revoke every session token of the calling user.
pub async fn log_out_all(
    user_id: web::ReqData<UserId>,
    pool: web::Data<PgPool>,
) -> AuthResult<HttpResponse> {
    revoke_all_tokens(&pool, *user_id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
