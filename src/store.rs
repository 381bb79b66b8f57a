//! User persistence
//!
//! `UserStore` is the seam between the session manager and storage. Every
//! method is atomic on its own; the session manager does no locking of its
//! own and relies on `swap_refresh_hash` to make rotation single-use.

use crate::error::AuthError;
use crate::models::{NewUser, User};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError>;

    /// Insert a user. Fails with `EmailExists` when the email is taken.
    async fn create(&self, new_user: NewUser) -> Result<User, AuthError>;

    /// Overwrite (or clear) the stored refresh token hash.
    ///
    /// Returns `None` when no user has `id`.
    async fn update_refresh_hash(
        &self,
        id: i32,
        hash: Option<&str>,
    ) -> Result<Option<User>, AuthError>;

    /// Replace the refresh token hash only if it is still `expected`.
    ///
    /// Returns `None` when the user is gone or another writer got there first.
    async fn swap_refresh_hash(
        &self,
        id: i32,
        expected: &str,
        new: &str,
    ) -> Result<Option<User>, AuthError>;
}

// ============================================
// PostgreSQL
// ============================================

/// sqlx-backed store over the `users` table
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create the `users` table if it does not exist
    pub async fn migrate(&self) -> Result<(), AuthError> {
        tracing::info!("Running authentication database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id SERIAL PRIMARY KEY,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                hashed_password VARCHAR(255) NOT NULL,
                hashed_refresh_token VARCHAR(255),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
        )
        .execute(&self.db)
        .await?;

        tracing::info!("Authentication migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AuthError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, hashed_password)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.hashed_password)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(user) => Ok(user),
            // Lost a signup race on the unique email index
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AuthError::EmailExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_refresh_hash(
        &self,
        id: i32,
        hash: Option<&str>,
    ) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as(
            r#"
            UPDATE users SET
                hashed_refresh_token = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(hash)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn swap_refresh_hash(
        &self,
        id: i32,
        expected: &str,
        new: &str,
    ) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as(
            r#"
            UPDATE users SET
                hashed_refresh_token = $3,
                updated_at = NOW()
            WHERE id = $1 AND hashed_refresh_token = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(new)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}

// ============================================
// In-memory
// ============================================

#[derive(Default)]
struct MemoryState {
    next_id: i32,
    users: HashMap<i32, User>,
}

/// Process-local store with the same per-call atomicity as `PgUserStore`
#[derive(Default)]
pub struct MemoryUserStore {
    state: RwLock<MemoryState>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AuthError> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.email == new_user.email) {
            return Err(AuthError::EmailExists);
        }

        state.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: state.next_id,
            name: new_user.name,
            email: new_user.email,
            hashed_password: new_user.hashed_password,
            hashed_refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_refresh_hash(
        &self,
        id: i32,
        hash: Option<&str>,
    ) -> Result<Option<User>, AuthError> {
        let mut state = self.state.write().await;

        Ok(state.users.get_mut(&id).map(|user| {
            user.hashed_refresh_token = hash.map(String::from);
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn swap_refresh_hash(
        &self,
        id: i32,
        expected: &str,
        new: &str,
    ) -> Result<Option<User>, AuthError> {
        let mut state = self.state.write().await;

        let user = match state.users.get_mut(&id) {
            Some(user) if user.hashed_refresh_token.as_deref() == Some(expected) => user,
            _ => return Ok(None),
        };

        user.hashed_refresh_token = Some(new.to_string());
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}
