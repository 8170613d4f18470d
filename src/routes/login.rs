//! src/routes/login.rs

use crate::authentication::{issue_token, validate_credentials, AuthorizationError, Credentials};
use crate::error::AuthResult;
use actix_web::{web, HttpResponse};
use secrecy::Secret;
use sqlx::PgPool;

#[derive(serde::Deserialize)]
pub struct LoginData {
    username: Option<String>,
    password: Option<Secret<String>>,
}

#[derive(serde::Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[tracing::instrument(
    skip(payload, pool),
    fields(username = tracing::field::Empty, user_id = tracing::field::Empty)
)]
pub async fn login(
    payload: web::Json<LoginData>,
    pool: web::Data<PgPool>,
) -> AuthResult<HttpResponse> {
    let LoginData { username, password } = payload.into_inner();
    // a missing field reads exactly like bad credentials
    let (username, password) = match (username, password) {
        (Some(username), Some(password)) => (username, password),
        _ => return Err(AuthorizationError::BadCredentials.into()),
    };
    let credentials = Credentials { username, password };
    tracing::Span::current().record("username", &tracing::field::display(&credentials.username));
    let user_id = validate_credentials(credentials, &pool)
        .await
        .map_err(|e| e.into_login_error())?;
    tracing::Span::current().record("user_id", &tracing::field::display(&user_id));
    let session_token = issue_token(&pool, user_id).await?;
    Ok(HttpResponse::Ok().json(TokenResponse {
        token: session_token.as_ref().to_owned(),
    }))
}
