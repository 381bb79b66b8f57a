//! Authentication HTTP Handlers
//!
//! REST API endpoints for authentication operations. The refresh token
//! travels in the `refresh_token` cookie; the token pair is also returned in
//! the JSON body.

use crate::cookies::{expired_refresh_cookie, refresh_cookie};
use crate::error::AuthError;
use crate::extractors::{AuthUser, RefreshCookie};
use crate::models::*;
use crate::service::AuthService;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use validator::Validate;

/// Shared auth service state
pub type AuthState = Arc<AuthService>;

// ============================================
// Route Builder
// ============================================

/// Create authentication routes, nested under `/api/auth`
pub fn create_routes(auth_service: Arc<AuthService>) -> Router {
    let auth = Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/logout", post(logout))
        .route("/refresh/:id", post(refresh))
        .route("/me", get(get_current_user));

    Router::new()
        .nest("/api/auth", auth)
        .with_state(auth_service)
}

// ============================================
// Signup / Signin
// ============================================

/// POST /api/auth/signup
///
/// Register a new user and start a session
pub async fn signup(
    State(auth): State<AuthState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, AuthError> {
    req.validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    let tokens = auth.signup(req).await?;
    let cookie = refresh_cookie(&tokens.refresh_token, auth.config().cookie_max_age)?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(tokens),
    ))
}

/// POST /api/auth/signin
///
/// Authenticate user and return access/refresh tokens
pub async fn signin(
    State(auth): State<AuthState>,
    Json(req): Json<SigninRequest>,
) -> Result<impl IntoResponse, AuthError> {
    req.validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    let tokens = auth.signin(req).await?;
    let cookie = refresh_cookie(&tokens.refresh_token, auth.config().cookie_max_age)?;

    Ok(([(header::SET_COOKIE, cookie)], Json(tokens)))
}

// ============================================
// Logout
// ============================================

/// POST /api/auth/logout
///
/// Clear the stored session and the refresh cookie
pub async fn logout(
    State(auth): State<AuthState>,
    RefreshCookie(refresh_token): RefreshCookie,
) -> Result<impl IntoResponse, Response> {
    auth.logout(&refresh_token)
        .await
        .map_err(session_failure)?;

    Ok((
        [(header::SET_COOKIE, expired_refresh_cookie())],
        Json(MessageResponse::new("Logged out successfully")),
    ))
}

/// Error response that also drops the client's refresh cookie when the
/// session behind it is gone or was never valid
fn session_failure(err: AuthError) -> Response {
    if err.ends_session() {
        ([(header::SET_COOKIE, expired_refresh_cookie())], err).into_response()
    } else {
        err.into_response()
    }
}

// ============================================
// Token Refresh
// ============================================

/// POST /api/auth/refresh/:id
///
/// Rotate the refresh token and issue a new pair
pub async fn refresh(
    State(auth): State<AuthState>,
    Path(user_id): Path<String>,
    RefreshCookie(refresh_token): RefreshCookie,
) -> Result<impl IntoResponse, Response> {
    let user_id: i32 = user_id.parse().map_err(|_| {
        AuthError::Validation("User id must be an integer".to_string()).into_response()
    })?;

    let (user, tokens) = auth
        .refresh(user_id, &refresh_token)
        .await
        .map_err(session_failure)?;
    let cookie = refresh_cookie(&tokens.refresh_token, auth.config().cookie_max_age)
        .map_err(IntoResponse::into_response)?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(RefreshResponse {
            message: "Token refreshed".to_string(),
            user: UserResponse::from(user),
            tokens,
        }),
    ))
}

// ============================================
// User Profile
// ============================================

/// GET /api/auth/me
///
/// Get current user profile
pub async fn get_current_user(
    State(auth): State<AuthState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AuthError> {
    let full_user = auth
        .get_user(user.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(serde_json::json!({
        "user": UserResponse::from(full_user)
    })))
}
