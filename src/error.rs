//! Authentication Error Types
//!
//! Centralized error handling for all authentication operations. Each
//! failure cause keeps its own variant so handlers and tests can tell them
//! apart; only unexpected failures collapse into `Database` or `Internal`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Authentication errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("User already exists")]
    EmailExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Refresh token is missing")]
    MissingRefreshToken,

    #[error("Refresh token does not match the active session")]
    RefreshTokenMismatch,

    #[error("Token subject does not match user id")]
    SubjectMismatch,

    #[error("No active session for user")]
    NoActiveSession,

    #[error("Password does not meet requirements")]
    WeakPassword,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error")]
    Internal,
}

impl AuthError {
    /// HTTP status the error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::EmailExists => StatusCode::CONFLICT,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidCredentials | AuthError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::InvalidToken
            | AuthError::MissingRefreshToken
            | AuthError::RefreshTokenMismatch => StatusCode::FORBIDDEN,
            AuthError::SubjectMismatch
            | AuthError::NoActiveSession
            | AuthError::WeakPassword
            | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Database(_) | AuthError::Config(_) | AuthError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the presented refresh token can never be used again
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidToken
                | AuthError::RefreshTokenMismatch
                | AuthError::SubjectMismatch
                | AuthError::NoActiveSession
        )
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::EmailExists => "email_exists",
            AuthError::UserNotFound => "user_not_found",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Unauthenticated => "unauthorized",
            AuthError::InvalidToken => "invalid_token",
            AuthError::MissingRefreshToken => "missing_refresh_token",
            AuthError::RefreshTokenMismatch => "refresh_token_mismatch",
            AuthError::SubjectMismatch => "subject_mismatch",
            AuthError::NoActiveSession => "no_active_session",
            AuthError::WeakPassword => "weak_password",
            AuthError::Validation(_) => "validation_error",
            AuthError::Config(_) => "configuration_error",
            AuthError::Database(_) | AuthError::Internal => "internal_error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::Validation(msg) => msg.clone(),
            AuthError::Database(_) | AuthError::Config(_) | AuthError::Internal => {
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        (
            self.status_code(),
            Json(serde_json::json!({
                "error": self.code(),
                "message": message
            })),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AuthError::Database(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        tracing::error!("Hashing error: {:?}", err);
        AuthError::Internal
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::debug!("JWT error: {:?}", err);
        AuthError::InvalidToken
    }
}
