//! Database operations for the `users` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `users` table.
///
/// `password_hash` is a PHC string and must never leave the server.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to register a user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a user and returns the stored row.
///
/// Emails are stored trimmed and lowercased.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails. A duplicate email or phone
/// surfaces as a unique violation (see [`DbError::is_unique_violation`]).
pub async fn create_user(pool: &PgPool, user: NewUser<'_>) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (name, email, password_hash, phone) \
         VALUES ($1, LOWER(TRIM($2)), $3, $4) \
         RETURNING id, public_id, name, email, password_hash, phone, created_at, updated_at",
    )
    .bind(user.name.trim())
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.phone.map(str::trim).filter(|p| !p.is_empty()))
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Looks up a user by email, case-insensitively.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, public_id, name, email, password_hash, phone, created_at, updated_at \
         FROM users \
         WHERE LOWER(email) = LOWER(TRIM($1))",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Looks up a user by public id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_id(pool: &PgPool, public_id: Uuid) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, public_id, name, email, password_hash, phone, created_at, updated_at \
         FROM users \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
