//! Authentication Extractors
//!
//! Axum extractors for the refresh token cookie and bearer access tokens.

use crate::cookies::{find_cookie, REFRESH_COOKIE};
use crate::error::AuthError;
use crate::handlers::AuthState;
use crate::models::Claims;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

/// Refresh token taken from the `refresh_token` cookie
#[derive(Debug, Clone)]
pub struct RefreshCookie(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for RefreshCookie
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        find_cookie(&parts.headers, REFRESH_COOKIE)
            .filter(|token| !token.is_empty())
            .map(|token| RefreshCookie(token.to_string()))
            .ok_or(AuthError::MissingRefreshToken)
    }
}

/// Authenticated user information extracted from access token claims
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
}

impl AuthUser {
    /// Create user from JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email.clone(),
        }
    }
}

#[async_trait]
impl FromRequestParts<AuthState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        auth: &AuthState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::Unauthenticated)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::Unauthenticated)?;

        let claims = auth.validate_access_token(token).map_err(|e| {
            tracing::debug!("Access token rejected: {}", e);
            AuthError::Unauthenticated
        })?;
        Ok(AuthUser::from_claims(&claims))
    }
}
