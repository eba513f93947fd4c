use sqlx::FromRow;

/// Longest label accepted for a tag.
pub const MAX_TAG_LEN: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}
