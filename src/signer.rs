//! JWT signing and verification for access and refresh tokens.

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::models::{Claims, User};

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

/// Which secret and lifetime a token uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiration: i64,
}

impl Keys {
    fn new(secret: &str, expiration: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiration,
        }
    }
}

/// HS256 token signer with separate keys per token kind
pub struct TokenSigner {
    access: Keys,
    refresh: Keys,
}

impl TokenSigner {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access: Keys::new(&config.access_token_secret, config.access_token_expiration),
            refresh: Keys::new(&config.refresh_token_secret, config.refresh_token_expiration),
        }
    }

    fn keys(&self, kind: TokenKind) -> &Keys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Sign a `{sub, email}` token for `user`
    pub fn sign(&self, user: &User, kind: TokenKind) -> Result<String, AuthError> {
        let keys = self.keys(kind);
        let now = Utc::now();
        let exp = Duration::try_seconds(keys.expiration)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| AuthError::Config("Token expiration out of range".to_string()))?;

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::default(), &claims, &keys.encoding)?;
        Ok(token)
    }

    /// Check signature and expiry, then return the claims
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.keys(kind).decoding, &validation)?;
        Ok(token_data.claims)
    }
}
