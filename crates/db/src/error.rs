//! Errors returned by the persistence layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("row not found")]
    NotFound,

    /// A unique constraint rejected the write; names the column.
    #[error("a row with this {0} already exists")]
    Duplicate(&'static str),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}
