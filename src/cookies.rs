//! `refresh_token` cookie helpers.

use crate::error::AuthError;

use axum::http::{header, HeaderMap, HeaderValue};

/// Name of the cookie carrying the refresh token
pub const REFRESH_COOKIE: &str = "refresh_token";

/// `Set-Cookie` value handing `token` to the client
pub fn refresh_cookie(token: &str, max_age: i64) -> Result<HeaderValue, AuthError> {
    HeaderValue::from_str(&format!(
        "{REFRESH_COOKIE}={token}; Max-Age={max_age}; Path=/; HttpOnly"
    ))
    .map_err(|_| {
        tracing::error!("Refresh token is not a valid cookie value");
        AuthError::Internal
    })
}

/// `Set-Cookie` value removing the refresh token from the client
pub fn expired_refresh_cookie() -> HeaderValue {
    HeaderValue::from_static("refresh_token=; Max-Age=0; Path=/; HttpOnly")
}

/// Look up a cookie by name across all `Cookie` headers
pub fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}
