//! Taskhub Todo Core - Todo business logic
//!
//! CRUD with strict per-user ownership, list filtering along the
//! importance/urgency matrix, and statistics computed in memory and
//! cached in the shared store.

pub mod error;
pub mod service;

pub use error::TodoError;
pub use service::{CreateTodoInput, TodoListPage, TodoQuery, TodoService, TodoStatsReport, UpdateTodoInput};
