//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Errors produced while authenticating a protected request.
#[derive(Debug)]
pub enum AuthError {
    /// No bearer credential was presented
    NoToken,
    /// The bearer credential failed signature, expiry, or type checks
    InvalidToken,
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NoToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AuthError::NoToken => "No token provided",
            AuthError::InvalidToken => "Invalid token",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: &'static str,
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                message: self.message(),
            }),
        )
            .into_response()
    }
}
