//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// Stored value could not be decoded into a domain type
    #[error("corrupt row: {0}")]
    Decode(String),
}

impl DbError {
    /// Whether the error is a unique-constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Sqlx(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}

/// Result alias for repository operations
pub type DbResult<T> = Result<T, DbError>;
