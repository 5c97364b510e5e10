//! Taskhub Types - Shared domain types
//!
//! This crate contains domain types used across Taskhub services:
//! - User identity, account tier and subscription state
//! - Todo items and their importance/urgency matrix
//! - Orders, plans and payment methods
//! - Reports and todo statistics

pub mod order;
pub mod report;
pub mod stats;
pub mod todo;
pub mod user;

pub use order::*;
pub use report::*;
pub use stats::*;
pub use todo::*;
pub use user::*;
