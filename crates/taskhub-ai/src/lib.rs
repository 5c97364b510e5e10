//! Taskhub AI - Productivity analysis via an LLM API
//!
//! Thin chat-completions client plus the prompt assembled from a user's
//! todo history. Without an API key, or when the provider misbehaves,
//! the client answers with a canned analysis so the feature degrades
//! instead of failing.

pub mod client;
pub mod error;
pub mod prompt;

pub use client::{AiClient, AiConfig};
pub use error::AiError;
pub use prompt::{build_analysis_prompt, EMPTY_HISTORY_MESSAGE};
