use chrono::Utc;
use sqlx::SqlitePool;

use super::{is_unique_violation, StoreError};
use crate::auth::hash_password;
use crate::models::User;

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub is_admin: bool,
}

/// Insert a user with an argon2 hash of the given password.
pub async fn create(pool: &SqlitePool, new: NewUser<'_>) -> Result<User, StoreError> {
    let hash = hash_password(new.password)?;
    let joined_at = Utc::now().to_rfc3339();

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (username, email, password, joined_at, is_admin)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new.username)
    .bind(new.email)
    .bind(&hash)
    .bind(&joined_at)
    .bind(new.is_admin)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::UserExists
        } else {
            StoreError::Database(e)
        }
    })?;

    tracing::info!(user_id = user.id, username = %user.username, "Created user");
    Ok(user)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<User, StoreError> {
    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(StoreError::from_lookup)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<User, StoreError> {
    sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await
        .map_err(StoreError::from_lookup)
}

pub async fn username_exists(pool: &SqlitePool, username: &str) -> Result<bool, StoreError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn email_exists(pool: &SqlitePool, email: &str) -> Result<bool, StoreError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}
