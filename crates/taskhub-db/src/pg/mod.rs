//! PostgreSQL repository implementations

mod order;
mod report;
mod todo;
mod user;

pub use order::PgOrderRepository;
pub use report::PgReportRepository;
pub use todo::PgTodoRepository;
pub use user::PgUserRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub users: PgUserRepository,
    pub todos: PgTodoRepository,
    pub orders: PgOrderRepository,
    pub reports: PgReportRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            todos: PgTodoRepository::new(pool.clone()),
            orders: PgOrderRepository::new(pool.clone()),
            reports: PgReportRepository::new(pool),
        }
    }
}
