//! src/authentication/middleware.rs

use crate::authentication::resolve_token;
use crate::domain::SessionToken;
use crate::error::Error;
use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    web, HttpMessage, HttpRequest,
};
use actix_web_lab::middleware::Next;
use anyhow::Context;
use sqlx::PgPool;
use std::ops::Deref;
use uuid::Uuid;

/// Why a request carries no usable authenticated identity.
#[derive(thiserror::Error, Debug)]
pub enum TokenAuthError {
    #[error("Authentication credentials were not provided.")]
    MissingCredentials,
    #[error("Invalid token.")]
    InvalidToken,
}

/// Access control gate for the protected scope: resolves the presented
/// bearer token to its owner or rejects the request.
///
/// On success the owner's [`UserId`] and the presented [`SessionToken`] are
/// inserted into the request extensions for handlers to extract.
pub async fn reject_anonymous_users(
    mut req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let pool = req
        .app_data::<web::Data<PgPool>>()
        .cloned()
        .context("Database pool is missing from application data.")
        .map_err(|e| actix_web::Error::from(Error::UnexpectedError(e)))?;

    let token = match presented_token(req.request()) {
        Ok(token) => token,
        Err(e) => return Err(Error::from(e).into()),
    };
    match resolve_token(&pool, &token)
        .await
        .map_err(actix_web::Error::from)?
    {
        Some(user_id) => {
            req.extensions_mut().insert(UserId(user_id));
            req.extensions_mut().insert(token);
            next.call(req).await
        }
        None => Err(Error::from(TokenAuthError::InvalidToken).into()),
    }
}

/// Extract the token presented via `Authorization: Token <value>`.
fn presented_token(request: &HttpRequest) -> Result<SessionToken, TokenAuthError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(TokenAuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| TokenAuthError::InvalidToken)?;
    let token_value = header_value
        .strip_prefix("Token ")
        .ok_or(TokenAuthError::InvalidToken)?;
    SessionToken::parse(token_value.to_string()).map_err(|_| TokenAuthError::InvalidToken)
}

#[derive(Debug, Clone, Copy)]
pub struct UserId(Uuid);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Deref for UserId {
    type Target = Uuid;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
