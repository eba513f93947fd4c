use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string, never the plain password.
    pub password: String,
    pub joined_at: String,
    pub is_admin: bool,
}
