//! Report errors

use thiserror::Error;

/// Report errors
#[derive(Error, Debug)]
pub enum ReportError {
    /// Report not found
    #[error("report not found")]
    NotFound,

    /// Report belongs to another user
    #[error("report belongs to another user")]
    Forbidden,

    /// PDF rendering failed
    #[error("pdf rendering failed: {0}")]
    Render(String),

    /// Object storage operation failed
    #[error("storage error: {0}")]
    Storage(String),

    /// No object storage is configured
    #[error("object storage not configured")]
    StorageNotConfigured,

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] taskhub_db::DbError),
}
