//! src/error.rs

use crate::authentication::{AuthorizationError, TokenAuthError};
use crate::domain::ValidationError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

pub type AuthResult<T> = Result<T, Error>;

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

#[derive(thiserror::Error)]
pub enum Error {
    #[error("Invalid account input")]
    Validation(#[from] ValidationError),
    #[error("Authorization failed")]
    Authorization(#[from] AuthorizationError),
    #[error("Authentication failed")]
    Authentication(#[from] TokenAuthError),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::Authorization(_) => StatusCode::BAD_REQUEST,
            Error::Authentication(_) => StatusCode::FORBIDDEN,
            Error::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Error::Validation(e) => {
                let (field, messages) = e.field_errors();
                field_error_body(field, &messages)
            }
            Error::Authorization(e) => field_error_body(e.field(), &[e.to_string()]),
            Error::Authentication(e) => serde_json::json!({ "detail": e.to_string() }),
            Error::UnexpectedError(_) => {
                serde_json::json!({ "detail": "Internal server error." })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Render a field-scoped error as `{"<field>": ["<message>", ...]}`.
fn field_error_body(field: &str, messages: &[String]) -> serde_json::Value {
    let mut body = serde_json::Map::new();
    body.insert(field.to_owned(), serde_json::json!(messages));
    serde_json::Value::Object(body)
}
