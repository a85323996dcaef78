//! JWT token generation and validation
//!
//! Tokens are signed with HS256 and carry the user id plus an admin flag.
//! Three token types exist:
//!
//! - **Access** (24 h): sent as `Authorization: Bearer` on API requests
//! - **Refresh** (30 d): exchanged for new access tokens
//! - **Reset** (1 h): single-purpose password-reset links sent by email
//!
//! A token of one type never validates as another; the type is a claim and
//! every validation path checks it.
//!
//! # Example
//!
//! ```
//! use partledger_shared::auth::jwt::{create_token, validate_access_token, Claims, TokenType};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let claims = Claims::new(42, true, TokenType::Access);
//! let token = create_token(&claims, "your-secret-key-at-least-32-bytes")?;
//!
//! let validated = validate_access_token(&token, "your-secret-key-at-least-32-bytes")?;
//! assert_eq!(validated.sub, 42);
//! assert!(validated.admin);
//! # Ok(())
//! # }
//! ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const ISSUER: &str = "partledger";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token is valid but of the wrong type for this operation
    #[error("Expected {expected} token")]
    WrongType { expected: &'static str },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token (24 hours)
    Access,

    /// Refresh token (30 days)
    Refresh,

    /// Password-reset token (1 hour)
    Reset,
}

impl TokenType {
    /// Default expiration for the token type
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(24),
            TokenType::Refresh => Duration::days(30),
            TokenType::Reset => Duration::hours(1),
        }
    }

    /// Token type as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
            TokenType::Reset => "reset",
        }
    }
}

/// JWT claims
///
/// Standard claims (`sub`, `iss`, `iat`, `exp`, `nbf`) plus the admin flag
/// and token type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: i64,

    /// Issuer - always "partledger"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Whether the subject is an administrator (custom claim)
    pub admin: bool,

    /// Token type (custom claim)
    pub token_type: TokenType,
}

impl Claims {
    /// Creates new claims with the type's default expiration
    pub fn new(user_id: i64, admin: bool, token_type: TokenType) -> Self {
        let now = Utc::now();
        let expiration = now + token_type.default_expiration();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            admin,
            token_type,
        }
    }
}

/// Creates a JWT token from claims
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT token and extracts claims
///
/// Verifies the signature, expiration, not-before, and issuer.
///
/// # Errors
///
/// Returns `JwtError::Expired` for expired tokens and
/// `JwtError::ValidationError` for everything else that fails.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

fn validate_typed(token: &str, secret: &str, expected: TokenType) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != expected {
        return Err(JwtError::WrongType {
            expected: expected.as_str(),
        });
    }

    Ok(claims)
}

/// Validates a token and checks it is an access token
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Access)
}

/// Validates a token and checks it is a refresh token
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Refresh)
}

/// Validates a token and checks it is a password-reset token
///
/// Reset links embed these; an access or refresh token pasted into the
/// reset endpoint is rejected.
pub fn validate_reset_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Reset)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_access_token_round_trip() {
        let claims = Claims::new(7, false, TokenType::Access);
        let token = create_token(&claims, SECRET).unwrap();

        let validated = validate_access_token(&token, SECRET).unwrap();
        assert_eq!(validated.sub, 7);
        assert!(!validated.admin);
        assert_eq!(validated.token_type, TokenType::Access);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = Claims::new(7, false, TokenType::Access);
        let token = create_token(&claims, SECRET).unwrap();

        assert!(validate_access_token(&token, "another-secret-also-32-bytes-long!").is_err());
    }

    #[test]
    fn test_token_types_do_not_cross() {
        let refresh = create_token(&Claims::new(7, false, TokenType::Refresh), SECRET).unwrap();
        let reset = create_token(&Claims::new(7, false, TokenType::Reset), SECRET).unwrap();

        assert!(matches!(
            validate_access_token(&refresh, SECRET),
            Err(JwtError::WrongType { expected: "access" })
        ));
        assert!(matches!(
            validate_refresh_token(&reset, SECRET),
            Err(JwtError::WrongType { expected: "refresh" })
        ));
        assert!(validate_reset_token(&reset, SECRET).is_ok());
    }

    #[test]
    fn test_expirations_ordered_by_purpose() {
        assert!(TokenType::Reset.default_expiration() < TokenType::Access.default_expiration());
        assert!(TokenType::Access.default_expiration() < TokenType::Refresh.default_expiration());
    }
}
