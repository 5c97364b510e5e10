//! Todo statistics, computed in memory from a user's todos

use serde::{Deserialize, Serialize};

use crate::{Importance, Todo, TodoStatus, URGENCY_MAX, URGENCY_MIN};

/// Counts by importance level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportanceBreakdown {
    pub a: u64,
    pub b: u64,
    pub c: u64,
    pub d: u64,
}

impl ImportanceBreakdown {
    fn bump(&mut self, importance: Importance) {
        match importance {
            Importance::A => self.a += 1,
            Importance::B => self.b += 1,
            Importance::C => self.c += 1,
            Importance::D => self.d += 1,
        }
    }

    /// Total across all levels
    pub fn total(&self) -> u64 {
        self.a + self.b + self.c + self.d
    }
}

/// Aggregate statistics over a user's todos
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodoStats {
    /// Total number of todos
    pub total: u64,
    /// Completed todos
    pub completed: u64,
    /// Pending todos
    pub pending: u64,
    /// In-progress todos
    pub in_progress: u64,
    /// Cancelled todos
    pub cancelled: u64,
    /// round(completed / total * 100); 0 when there are no todos
    pub completion_rate: u8,
    /// Completed on or before the due date
    pub completed_on_time: u64,
    /// Counts by importance level
    pub by_importance: ImportanceBreakdown,
    /// Counts by urgency 1..=5, index 0 holding urgency 1
    pub by_urgency: [u64; 5],
}

impl TodoStats {
    /// Compute statistics from a set of todos.
    ///
    /// The counts partition the input by status, importance and urgency;
    /// todos with an out-of-range urgency (should not exist) are skipped
    /// in the urgency breakdown only.
    pub fn from_todos(todos: &[Todo]) -> Self {
        let mut stats = Self {
            total: todos.len() as u64,
            ..Self::default()
        };

        for todo in todos {
            match todo.status {
                TodoStatus::Completed => stats.completed += 1,
                TodoStatus::Pending => stats.pending += 1,
                TodoStatus::InProgress => stats.in_progress += 1,
                TodoStatus::Cancelled => stats.cancelled += 1,
            }

            stats.by_importance.bump(todo.importance);

            if (URGENCY_MIN..=URGENCY_MAX).contains(&todo.urgency) {
                stats.by_urgency[(todo.urgency - 1) as usize] += 1;
            }

            if todo.completed_on_time() {
                stats.completed_on_time += 1;
            }
        }

        stats.completion_rate = completion_rate(stats.completed, stats.total);
        stats
    }
}

/// round(completed / total * 100), with 0 for an empty set
pub fn completion_rate(completed: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u8
}
