//! Errors raised by the session core and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::services::cache::CacheError;
use crate::services::token::TokenError;

/// Message for every bearer failure. Missing, expired and malformed tokens look the same.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid token or expired token.";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid or expired credential")]
    Unauthenticated,

    #[error("user not found")]
    PrincipalNotFound,

    #[error("password is incorrect")]
    InvalidCredentials,

    #[error("too many sign-in attempts")]
    RateLimited,

    #[error("session cache read failed")]
    CacheRead(#[source] CacheError),

    #[error("session cache write failed")]
    CacheWrite(#[source] CacheError),

    #[error("user store lookup failed")]
    UserStore(#[from] sqlx::Error),

    #[error("user store lookup timed out")]
    UserStoreTimeout,

    #[error("token signing failed")]
    Signature(#[from] TokenError),

    #[error("session rotation did not complete")]
    RotationIncomplete(#[source] Box<AuthError>),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated => StatusCode::FORBIDDEN,
            AuthError::PrincipalNotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::CacheRead(_) | AuthError::CacheWrite(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::UserStore(_)
            | AuthError::UserStoreTimeout
            | AuthError::Signature(_)
            | AuthError::RotationIncomplete(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The text shown to clients. Never includes keys, tokens or sources.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => INVALID_TOKEN_MESSAGE,
            AuthError::PrincipalNotFound => "User not found",
            AuthError::InvalidCredentials => "Password is incorrect",
            AuthError::RateLimited => "Too many sign-in attempts, try again later.",
            AuthError::CacheRead(_) | AuthError::CacheWrite(_) => "Session store unavailable",
            AuthError::RotationIncomplete(_) => "Session could not be renewed, please sign in again.",
            AuthError::UserStore(_) | AuthError::UserStoreTimeout | AuthError::Signature(_) => {
                "Internal server error"
            }
        }
    }

    /// Walks the source chain into one line for the server log.
    fn log_chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self.log_chain());
        } else {
            tracing::warn!(status = status.as_u16(), "{}", self);
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
