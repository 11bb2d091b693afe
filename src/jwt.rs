//! JWT token generation and validation.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived access token (15 minutes) - sent as a bearer header
    Access,
    /// Long-lived refresh token (7 days) - transported only via cookie
    Refresh,
}

/// Signed claims shared by both token kinds. Access and refresh tokens
/// carry the same payload but are signed with different secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user UUID)
    pub sub: String,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Access token duration: 15 minutes
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 15 * 60;

/// Refresh token duration: 7 days
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Configuration for JWT operations.
///
/// Holds two independent HS256 key pairs so a refresh token can never
/// validate as an access token even if the type claim were forged.
#[derive(Clone)]
pub struct JwtConfig {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

/// Result of generating a token.
#[derive(Debug, Clone)]
pub struct TokenResult {
    /// The JWT token string
    pub token: String,
    /// Token duration in seconds
    pub duration: u64,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secrets.
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
        }
    }

    /// Generate an access token for a user.
    /// Access tokens are short-lived (15 minutes) and stateless.
    pub fn generate_access_token(&self, user_uuid: &str) -> Result<TokenResult, JwtError> {
        self.generate(
            user_uuid,
            TokenType::Access,
            ACCESS_TOKEN_DURATION_SECS,
            &self.access_encoding,
        )
    }

    /// Generate a refresh token for a user.
    /// Refresh tokens are long-lived (7 days) and travel only in a cookie.
    pub fn generate_refresh_token(&self, user_uuid: &str) -> Result<TokenResult, JwtError> {
        self.generate(
            user_uuid,
            TokenType::Refresh,
            REFRESH_TOKEN_DURATION_SECS,
            &self.refresh_encoding,
        )
    }

    fn generate(
        &self,
        user_uuid: &str,
        token_type: TokenType,
        duration: u64,
        key: &EncodingKey,
    ) -> Result<TokenResult, JwtError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| JwtError::TimeError)?
            .as_secs();

        let claims = Claims {
            sub: user_uuid.to_string(),
            token_type,
            iat: now,
            exp: now + duration,
        };

        let token =
            jsonwebtoken::encode(&Header::default(), &claims, key).map_err(JwtError::Encoding)?;

        Ok(TokenResult { token, duration })
    }

    /// Validate and decode an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        Self::validate(token, TokenType::Access, &self.access_decoding)
    }

    /// Validate and decode a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        Self::validate(token, TokenType::Refresh, &self.refresh_decoding)
    }

    fn validate(token: &str, expected: TokenType, key: &DecodingKey) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data =
            jsonwebtoken::decode::<Claims>(token, key, &validation).map_err(JwtError::Decoding)?;

        if token_data.claims.token_type != expected {
            return Err(JwtError::WrongTokenType);
        }

        Ok(token_data.claims)
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Error decoding the token
    Decoding(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
    /// Wrong token type (e.g., using refresh token as access token)
    WrongTokenType,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Decoding(e) => write!(f, "Failed to decode token: {}", e),
            JwtError::TimeError => write!(f, "System time error"),
            JwtError::WrongTokenType => write!(f, "Wrong token type"),
        }
    }
}

impl std::error::Error for JwtError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig::new(b"access-secret-for-testing", b"refresh-secret-for-testing")
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let config = test_config();

        let result = config.generate_access_token("uuid-123").unwrap();
        assert_eq!(result.duration, ACCESS_TOKEN_DURATION_SECS);

        let claims = config.validate_access_token(&result.token).unwrap();
        assert_eq!(claims.sub, "uuid-123");
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp, claims.iat + ACCESS_TOKEN_DURATION_SECS);
    }

    #[test]
    fn test_generate_and_validate_refresh_token() {
        let config = test_config();

        let result = config.generate_refresh_token("uuid-123").unwrap();
        assert_eq!(result.duration, REFRESH_TOKEN_DURATION_SECS);

        let claims = config.validate_refresh_token(&result.token).unwrap();
        assert_eq!(claims.sub, "uuid-123");
        assert_eq!(claims.token_type, TokenType::Refresh);
    }

    #[test]
    fn test_wrong_token_type_rejected() {
        let config = test_config();

        let access = config.generate_access_token("uuid-123").unwrap();
        let refresh = config.generate_refresh_token("uuid-123").unwrap();

        // Access token should fail validate_refresh_token
        assert!(config.validate_refresh_token(&access.token).is_err());

        // Refresh token should fail validate_access_token
        assert!(config.validate_access_token(&refresh.token).is_err());
    }

    #[test]
    fn test_tokens_signed_with_distinct_secrets() {
        let config = test_config();

        // A token carrying typ=access but signed with the refresh secret
        // must not verify against the access secret.
        let forged = JwtConfig::new(b"refresh-secret-for-testing", b"refresh-secret-for-testing")
            .generate_access_token("uuid-123")
            .unwrap();

        assert!(config.validate_access_token(&forged.token).is_err());
    }

    #[test]
    fn test_invalid_token() {
        let config = test_config();

        let result = config.validate_access_token("invalid-token");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let config1 = JwtConfig::new(b"secret-1", b"refresh-1");
        let config2 = JwtConfig::new(b"secret-2", b"refresh-2");

        let result = config1.generate_access_token("uuid-123").unwrap();

        let validation = config2.validate_access_token(&result.token);
        assert!(validation.is_err());
    }

    #[test]
    fn test_expired_token() {
        let secret = b"test-secret";
        let encoding_key = EncodingKey::from_secret(secret);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        // Create claims with exp in the past
        let claims = Claims {
            sub: "uuid-123".to_string(),
            token_type: TokenType::Access,
            iat: now - 100,
            exp: now - 50, // Expired 50 seconds ago
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &encoding_key).unwrap();

        let config = JwtConfig::new(secret, b"other-secret");
        let result = config.validate_access_token(&token);
        assert!(result.is_err());
    }
}
