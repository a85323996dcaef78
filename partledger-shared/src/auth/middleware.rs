//! Per-request authentication context
//!
//! After the API server validates a bearer token, it stores an
//! [`AuthContext`] in the request extensions. Handlers can take it as an
//! argument directly; it implements `FromRequestParts`.
//!
//! # Example
//!
//! ```
//! use partledger_shared::auth::middleware::AuthContext;
//!
//! async fn handler(auth: AuthContext) -> String {
//!     format!("User: {} (admin: {})", auth.user_id, auth.is_admin)
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts, http::StatusCode};
use serde::{Deserialize, Serialize};

use super::jwt::Claims;

/// Authentication context added to request extensions
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: i64,

    /// Whether the user authenticated as an administrator
    pub is_admin: bool,
}

impl AuthContext {
    /// Creates an auth context from validated JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            is_admin: claims.admin,
        }
    }
}

/// Extracts the context placed in request extensions by the auth layer
///
/// Rejects with 401 when no auth layer ran for the route.
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or((StatusCode::UNAUTHORIZED, "Missing authentication"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenType;

    #[test]
    fn test_from_claims() {
        let claims = Claims::new(11, true, TokenType::Access);
        let ctx = AuthContext::from_claims(&claims);
        assert_eq!(ctx.user_id, 11);
        assert!(ctx.is_admin);
    }
}
