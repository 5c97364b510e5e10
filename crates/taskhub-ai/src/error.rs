//! AI client errors

use thiserror::Error;

/// AI client errors
#[derive(Error, Debug)]
pub enum AiError {
    /// Provider request failed
    #[error("provider error: {0}")]
    Provider(String),

    /// Provider returned an unusable response
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}
