//! Authentication Configuration
//!
//! All configuration values are loaded from environment variables and handed
//! to the session manager explicitly. No hardcoded secrets.

use crate::error::AuthError;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

/// Upper bound for every expiry and cookie lifetime (ten years, in seconds)
pub const MAX_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Authentication configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret for signing access tokens (from ACCESS_TOKEN_KEY env var)
    pub access_token_secret: String,

    /// Access token expiration in seconds (from ACCESS_TOKEN_TIME env var)
    pub access_token_expiration: i64,

    /// Secret for signing refresh tokens (from REFRESH_TOKEN_KEY env var)
    pub refresh_token_secret: String,

    /// Refresh token expiration in seconds (from REFRESH_TOKEN_TIME env var)
    pub refresh_token_expiration: i64,

    /// Max-Age of the refresh token cookie in seconds (from COOKIE_TIME env var)
    pub cookie_max_age: i64,

    /// Argon2 memory cost in KiB (from ARGON2_MEMORY_COST env var)
    pub argon2_memory_cost: u32,

    /// Argon2 time cost (iterations) (from ARGON2_TIME_COST env var)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (from ARGON2_PARALLELISM env var)
    pub argon2_parallelism: u32,

    /// Minimum password length (from MIN_PASSWORD_LENGTH env var)
    pub min_password_length: usize,
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(get: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_token_secret = get("ACCESS_TOKEN_KEY").ok_or_else(|| {
            AuthError::Config("ACCESS_TOKEN_KEY environment variable must be set".to_string())
        })?;

        let refresh_token_secret = get("REFRESH_TOKEN_KEY").ok_or_else(|| {
            AuthError::Config("REFRESH_TOKEN_KEY environment variable must be set".to_string())
        })?;

        let refresh_token_expiration: i64 =
            parse(&get, "REFRESH_TOKEN_TIME").unwrap_or(1_296_000); // 15 days

        Ok(Self {
            access_token_secret,
            access_token_expiration: parse(&get, "ACCESS_TOKEN_TIME").unwrap_or(900), // 15 minutes
            refresh_token_secret,
            refresh_token_expiration,
            cookie_max_age: parse(&get, "COOKIE_TIME").unwrap_or(refresh_token_expiration),
            argon2_memory_cost: parse(&get, "ARGON2_MEMORY_COST").unwrap_or(19_456), // 19 MiB
            argon2_time_cost: parse(&get, "ARGON2_TIME_COST").unwrap_or(2),
            argon2_parallelism: parse(&get, "ARGON2_PARALLELISM").unwrap_or(1),
            min_password_length: parse(&get, "MIN_PASSWORD_LENGTH").unwrap_or(6),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.access_token_secret.len() < 32 {
            return Err(AuthError::Config(
                "ACCESS_TOKEN_KEY must be at least 32 characters".to_string(),
            ));
        }

        if self.refresh_token_secret.len() < 32 {
            return Err(AuthError::Config(
                "REFRESH_TOKEN_KEY must be at least 32 characters".to_string(),
            ));
        }

        if self.access_token_secret == self.refresh_token_secret {
            return Err(AuthError::Config(
                "ACCESS_TOKEN_KEY and REFRESH_TOKEN_KEY must differ".to_string(),
            ));
        }

        if self.access_token_expiration <= 0 {
            return Err(AuthError::Config(
                "ACCESS_TOKEN_TIME must be positive".to_string(),
            ));
        }

        if self.refresh_token_expiration <= self.access_token_expiration {
            return Err(AuthError::Config(
                "REFRESH_TOKEN_TIME must be greater than ACCESS_TOKEN_TIME".to_string(),
            ));
        }

        if self.cookie_max_age <= 0 {
            return Err(AuthError::Config("COOKIE_TIME must be positive".to_string()));
        }

        for (key, secs) in [
            ("ACCESS_TOKEN_TIME", self.access_token_expiration),
            ("REFRESH_TOKEN_TIME", self.refresh_token_expiration),
            ("COOKIE_TIME", self.cookie_max_age),
        ] {
            if secs > MAX_LIFETIME_SECS {
                return Err(AuthError::Config(format!(
                    "{} must be at most {} seconds",
                    key, MAX_LIFETIME_SECS
                )));
            }
        }

        if self.min_password_length == 0 {
            return Err(AuthError::Config(
                "MIN_PASSWORD_LENGTH must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    get(key).and_then(|v| v.trim().parse().ok())
}

/// Server settings for the standalone binary
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// PostgreSQL connection string (from DATABASE_URL env var)
    pub database_url: String,

    /// Listen address (from BIND_ADDR env var)
    pub bind_addr: SocketAddr,

    /// Pool size (from DB_MAX_CONNECTIONS env var)
    pub max_connections: u32,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AuthError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| {
            AuthError::Config("DATABASE_URL environment variable must be set".to_string())
        })?;

        let bind_addr: SocketAddr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|_| AuthError::Config("BIND_ADDR must be a socket address".to_string()))?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
        })
    }
}
