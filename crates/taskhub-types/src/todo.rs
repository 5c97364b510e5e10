//! Todo items and the importance/urgency matrix

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ParseEnumError, UserId};

/// Unique todo identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(pub Uuid);

impl TodoId {
    /// Create a new random todo ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TodoId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Importance level, A (most important) through D
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Importance {
    A,
    B,
    C,
    D,
}

impl Importance {
    /// All levels, most important first
    pub const ALL: [Importance; 4] = [Self::A, Self::B, Self::C, Self::D];
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
            Self::C => write!(f, "C"),
            Self::D => write!(f, "D"),
        }
    }
}

impl std::str::FromStr for Importance {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            _ => Err(ParseEnumError::new("importance", s)),
        }
    }
}

/// Urgency range: 1 (most urgent) through 5 (can wait)
pub const URGENCY_MIN: i16 = 1;
pub const URGENCY_MAX: i16 = 5;

/// Whether a raw urgency value is within the 1..=5 matrix
pub fn urgency_is_valid(urgency: i16) -> bool {
    (URGENCY_MIN..=URGENCY_MAX).contains(&urgency)
}

/// Todo lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TodoStatus {
    /// All statuses
    pub const ALL: [TodoStatus; 4] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];
}

impl std::fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for TodoStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError::new("todo status", s)),
        }
    }
}

/// Sort order for todo listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoSort {
    /// Importance (A first), then urgency (1 first)
    Priority,
    /// Newest first
    CreatedAt,
    /// Earliest due date first
    DueDate,
}

impl Default for TodoSort {
    fn default() -> Self {
        Self::Priority
    }
}

impl std::str::FromStr for TodoSort {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "priority" => Ok(Self::Priority),
            "created_at" | "createdAt" => Ok(Self::CreatedAt),
            "due_date" | "dueDate" => Ok(Self::DueDate),
            _ => Err(ParseEnumError::new("todo sort", s)),
        }
    }
}

/// A todo item, owned by exactly one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    /// Todo ID
    pub id: TodoId,
    /// Owning user
    pub user_id: UserId,
    /// Title
    pub title: String,
    /// Free-form description
    pub description: Option<String>,
    /// Importance level
    pub importance: Importance,
    /// Urgency, 1..=5
    pub urgency: i16,
    /// Lifecycle status
    pub status: TodoStatus,
    /// Due date (if any)
    pub due_date: Option<DateTime<Utc>>,
    /// When the todo was completed (if it was)
    pub completed_at: Option<DateTime<Utc>>,
    /// When the todo was created
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Completed on or before the due date
    pub fn completed_on_time(&self) -> bool {
        self.status == TodoStatus::Completed
            && matches!(
                (self.completed_at, self.due_date),
                (Some(done), Some(due)) if done <= due
            )
    }
}
