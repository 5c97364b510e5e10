//! Application state for the API service.

use std::sync::Arc;

use taskhub_ai::AiClient;
use taskhub_auth_core::AuthService;
use taskhub_billing_core::PaymentService;
use taskhub_cache::Store;
use taskhub_db::pg::{
    PgOrderRepository, PgReportRepository, PgTodoRepository, PgUserRepository, Repositories,
};
use taskhub_db::DbPool;
use taskhub_report_core::ReportService;
use taskhub_todo_core::TodoService;

use crate::config::Config;

/// Concrete service types over the Postgres repositories
pub type Auth = AuthService<PgUserRepository>;
pub type Payments = PaymentService<PgUserRepository, PgOrderRepository>;
pub type Todos = TodoService<PgTodoRepository>;
pub type Reports = ReportService<PgReportRepository>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Auth service (credentials, tokens, blacklist)
    pub auth: Arc<Auth>,
    /// Payment service (orders, completion, webhooks)
    pub payments: Arc<Payments>,
    /// Todo service (CRUD + statistics)
    pub todos: Arc<Todos>,
    /// Report service (CRUD + PDF)
    pub reports: Arc<Reports>,
    /// AI analysis client
    pub ai: Arc<AiClient>,
    /// Database repositories (for direct access where no core service applies)
    pub repos: Repositories,
    /// Shared cache store (rate limits, blacklist, analysis cache)
    pub store: Arc<dyn Store>,
    /// Database pool (readiness probe)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
