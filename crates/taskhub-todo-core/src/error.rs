//! Todo errors

use thiserror::Error;

/// Todo errors
#[derive(Error, Debug)]
pub enum TodoError {
    /// Todo not found
    #[error("todo not found")]
    NotFound,

    /// Todo belongs to another user
    #[error("todo belongs to another user")]
    Forbidden,

    /// Request payload failed validation
    #[error("{0}")]
    Validation(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] taskhub_db::DbError),
}
