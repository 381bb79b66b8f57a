//! Authentication Service
//!
//! Credential verification, token issuance and refresh token rotation.
//!
//! A session is the Argon2 hash of the most recently issued refresh token,
//! stored on the user row. Signin and signup replace it, refresh swaps it for
//! the hash of a new token, logout clears it. A refresh token is accepted only
//! while it verifies against the refresh secret *and* matches that hash.

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::hashing::SecretHasher;
use crate::models::*;
use crate::signer::{TokenKind, TokenSigner};
use crate::store::UserStore;

use std::sync::Arc;

/// Authentication service
pub struct AuthService {
    store: Arc<dyn UserStore>,
    config: AuthConfig,
    signer: TokenSigner,
    hasher: SecretHasher,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(store: Arc<dyn UserStore>, config: AuthConfig) -> Result<Self, AuthError> {
        let signer = TokenSigner::new(&config);
        let hasher = SecretHasher::new(&config)?;

        Ok(Self {
            store,
            config,
            signer,
            hasher,
        })
    }

    /// Get reference to config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Validate password strength
    pub fn validate_password(&self, password: &str) -> Result<(), AuthError> {
        if password.chars().count() < self.config.min_password_length {
            return Err(AuthError::WeakPassword);
        }
        Ok(())
    }

    // ============================================
    // Token Issuance
    // ============================================

    /// Sign a new token pair and make its refresh token the active session
    async fn start_session(&self, user: &User) -> Result<TokenPair, AuthError> {
        let tokens = self.sign_pair(user)?;
        let hash = self.hasher.hash(&tokens.refresh_token)?;

        self.store
            .update_refresh_hash(user.id, Some(&hash))
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(tokens)
    }

    fn sign_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.signer.sign(user, TokenKind::Access)?,
            refresh_token: self.signer.sign(user, TokenKind::Refresh)?,
        })
    }

    /// Validate an access token
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.signer.verify(token, TokenKind::Access)
    }

    // ============================================
    // Signup / Signin
    // ============================================

    /// Register a new user and open their first session
    pub async fn signup(&self, req: SignupRequest) -> Result<TokenPair, AuthError> {
        self.validate_password(&req.password)?;

        if self.store.find_by_email(&req.email).await?.is_some() {
            return Err(AuthError::EmailExists);
        }

        let hashed_password = self.hasher.hash(&req.password)?;

        let user = self
            .store
            .create(NewUser {
                name: req.name,
                email: req.email,
                hashed_password,
            })
            .await?;

        let tokens = self.start_session(&user).await?;

        tracing::info!(user_id = user.id, "User signed up");
        Ok(tokens)
    }

    /// Check credentials and open a new session, replacing any previous one
    pub async fn signin(&self, req: SigninRequest) -> Result<TokenPair, AuthError> {
        let user = self
            .store
            .find_by_email(&req.email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self.hasher.verify(&req.password, &user.hashed_password)? {
            tracing::debug!(user_id = user.id, "Signin rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.start_session(&user).await?;

        tracing::info!(user_id = user.id, "User signed in");
        Ok(tokens)
    }

    // ============================================
    // Logout
    // ============================================

    /// End the session the refresh token belongs to
    ///
    /// The token itself stays cryptographically valid until it expires, but
    /// with the stored hash cleared it can no longer be refreshed.
    pub async fn logout(&self, refresh_token: &str) -> Result<User, AuthError> {
        let claims = self.signer.verify(refresh_token, TokenKind::Refresh)?;

        let user = self
            .store
            .update_refresh_hash(claims.sub, None)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        tracing::info!(user_id = user.id, "User logged out");
        Ok(user)
    }

    // ============================================
    // Token Refresh
    // ============================================

    /// Exchange a refresh token for a new pair (with rotation)
    ///
    /// `user_id` is the id the caller claims; it must match the verified
    /// token subject. On success the previous refresh token is void.
    pub async fn refresh(
        &self,
        user_id: i32,
        refresh_token: &str,
    ) -> Result<(User, TokenPair), AuthError> {
        let claims = self.signer.verify(refresh_token, TokenKind::Refresh)?;

        if claims.sub != user_id {
            return Err(AuthError::SubjectMismatch);
        }

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::NoActiveSession)?;

        let current_hash = user
            .hashed_refresh_token
            .clone()
            .ok_or(AuthError::NoActiveSession)?;

        if !self.hasher.verify(refresh_token, &current_hash)? {
            tracing::warn!(
                user_id = user.id,
                "Refresh token does not match active session, possible replay"
            );
            return Err(AuthError::RefreshTokenMismatch);
        }

        let tokens = self.sign_pair(&user)?;
        let new_hash = self.hasher.hash(&tokens.refresh_token)?;

        // Conditional write: a concurrent refresh with the same token loses here
        let updated = self
            .store
            .swap_refresh_hash(user.id, &current_hash, &new_hash)
            .await?
            .ok_or_else(|| {
                tracing::warn!(user_id = user.id, "Refresh token already rotated");
                AuthError::RefreshTokenMismatch
            })?;

        tracing::info!(user_id = updated.id, "Refresh token rotated");
        Ok((updated, tokens))
    }

    // ============================================
    // User Helpers
    // ============================================

    /// Get user by ID
    pub async fn get_user(&self, user_id: i32) -> Result<Option<User>, AuthError> {
        self.store.find_by_id(user_id).await
    }
}
