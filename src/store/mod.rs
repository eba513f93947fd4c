//! Persistence for users, entries and tags.
//!
//! Every operation takes the pool explicitly; multi-statement operations run
//! in a transaction that is rolled back if it is dropped before commit.

pub mod entries;
pub mod tags;
pub mod users;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("an entry with that title already exists")]
    DuplicateSlug,
    #[error("user already exists")]
    UserExists,
    #[error("only the author may change this entry")]
    NotAuthor,
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Map `RowNotFound` onto the domain not-found variant.
    pub(crate) fn from_lookup(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Database(other),
        }
    }
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
