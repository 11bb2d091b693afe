//! Axum extractors for authentication.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use super::errors::AuthError;
use crate::jwt::{Claims, JwtConfig};

/// Trait for state types that support bearer authentication.
pub trait HasAuthState {
    fn jwt(&self) -> &JwtConfig;
}

/// Extract the bearer token from the Authorization header, if present
/// and well-formed.
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Extractor for API endpoints that require authentication.
///
/// Validates the access token from the Authorization header. Pure
/// signature/expiry verification, no database access; the decoded claims
/// carry the subject for downstream handlers. CORS preflight requests
/// are answered by the CORS layer before routing and never reach this.
pub struct AuthUser(pub Claims);

impl<S> FromRequestParts<S> for AuthUser
where
    S: HasAuthState + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError::NoToken)?;

        let claims = state
            .jwt()
            .validate_access_token(token)
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthUser(claims))
    }
}
