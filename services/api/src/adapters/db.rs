//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tutor_core::domain::{NewUser, TokenPurpose, UserCredentials, UserRecord};
use tutor_core::ports::{DatabaseService, PortError, PortResult};
use uuid::Uuid;

const USER_COLUMNS: &str = "user_id, name, email, role, is_banned, email_verified, created_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRow {
    user_id: Uuid,
    name: String,
    email: String,
    role: String,
    is_banned: bool,
    email_verified: bool,
    created_at: DateTime<Utc>,
}
impl UserRow {
    fn to_domain(self) -> PortResult<UserRecord> {
        Ok(UserRecord {
            user_id: self.user_id,
            name: self.name,
            email: self.email,
            role: self.role.parse()?,
            is_banned: self.is_banned,
            email_verified: self.email_verified,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRow {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRow {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, user: NewUser) -> PortResult<UserRecord> {
        let query = format!(
            "INSERT INTO users (user_id, name, email, hashed_password, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.hashed_password)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    PortError::Conflict(format!("Email {} is already registered", user.email))
                }
                _ => unexpected(e),
            })?;
        row.to_domain()
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<UserRecord> {
        let query = format!("SELECT {} FROM users WHERE user_id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
                _ => unexpected(e),
            })?;
        row.to_domain()
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(row.to_domain())
    }

    async fn list_users(&self) -> PortResult<Vec<UserRecord>> {
        let query = format!("SELECT {} FROM users ORDER BY created_at DESC", USER_COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        rows.into_iter().map(UserRow::to_domain).collect()
    }

    async fn set_user_banned(&self, user_id: Uuid, banned: bool) -> PortResult<UserRecord> {
        let query = format!(
            "UPDATE users SET is_banned = $1 WHERE user_id = $2 RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(banned)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        row.to_domain()
    }

    async fn mark_email_verified(&self, user_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("UPDATE users SET email_verified = TRUE WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let result = sqlx::query("UPDATE users SET hashed_password = $1 WHERE user_id = $2")
            .bind(hashed_password)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_auth_sessions_for_user(&self, user_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_email_token(
        &self,
        token: &str,
        user_id: Uuid,
        purpose: TokenPurpose,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO email_tokens (token, user_id, purpose, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(token)
        .bind(user_id)
        .bind(purpose.as_str())
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn consume_email_token(&self, token: &str, purpose: TokenPurpose) -> PortResult<Uuid> {
        let (user_id, expires_at) = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            "DELETE FROM email_tokens WHERE token = $1 AND purpose = $2 RETURNING user_id, expires_at",
        )
        .bind(token)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::Invalid("Invalid or expired token".to_string()))?;

        if expires_at <= Utc::now() {
            return Err(PortError::Invalid("Invalid or expired token".to_string()));
        }
        Ok(user_id)
    }
}
