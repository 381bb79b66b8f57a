//! Session Auth
//!
//! Minimal authentication backend providing:
//! - User signup and signin
//! - Argon2id password hashing
//! - JWT access and refresh token pairs
//! - Refresh token rotation with a single active session per user
//! - Logout by invalidating the stored session
//!
//! Only an Argon2 hash of the latest refresh token is kept on the user row.
//! Rotation overwrites it with a compare-and-swap write, so a refresh token
//! can be exchanged at most once.
//!
//! # Configuration
//!
//! All configuration is loaded from environment variables:
//! - `ACCESS_TOKEN_KEY` - Secret for access tokens (required, min 32 chars)
//! - `ACCESS_TOKEN_TIME` - Access token expiration in seconds (default: 900)
//! - `REFRESH_TOKEN_KEY` - Secret for refresh tokens (required, min 32 chars)
//! - `REFRESH_TOKEN_TIME` - Refresh token expiration in seconds (default: 1296000)
//! - `COOKIE_TIME` - Refresh cookie Max-Age in seconds (default: refresh expiration)
//! - `DATABASE_URL` - PostgreSQL connection string (required by the server)
//!
//! # Usage
//!
//! ```rust,ignore
//! use session_auth::{create_routes, AuthConfig, AuthService, PgUserStore};
//!
//! let store = PgUserStore::new(pool);
//! store.migrate().await?;
//!
//! let auth = AuthService::new(Arc::new(store), AuthConfig::from_env()?)?;
//! let app = create_routes(Arc::new(auth));
//! ```

pub mod config;
pub mod cookies;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod hashing;
pub mod models;
pub mod service;
pub mod signer;
pub mod store;

// Re-export commonly used types
pub use config::{AuthConfig, ServerConfig};
pub use error::AuthError;
pub use extractors::{AuthUser, RefreshCookie};
pub use handlers::{create_routes, AuthState};
pub use models::*;
pub use service::AuthService;
pub use signer::{TokenKind, TokenSigner};
pub use store::{MemoryUserStore, PgUserStore, UserStore};
