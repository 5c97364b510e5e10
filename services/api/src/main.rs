//! Taskhub API
//!
//! Task-management backend providing REST endpoints.
//!
//! ## Endpoints
//!
//! - `POST /api/auth/register/{email,phone}` - Register
//! - `POST /api/auth/login/{email,phone,sms,wechat,google,github}` - Login
//! - `POST /api/auth/sms/send` - Send an SMS verification code
//! - `POST /api/auth/logout` / `GET /api/auth/me`
//! - `GET|PATCH /api/user/profile`, `GET /api/user/subscription`
//! - CRUD `/api/todos`, `GET /api/todos/stats`
//! - `GET /api/payment/plans`, orders CRUD, `POST /api/payment/mock-pay`
//! - `POST /api/payment/{alipay,wechat}/notify` - Gateway callbacks
//! - `POST /api/payment/stripe/webhook` - Stripe webhook handler
//! - CRUD `/api/reports`, PDF download/generation
//! - `GET /api/ai/analyze` - Pro-only AI analysis
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod extractors;
mod handlers;
mod rate_limit;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::connect_info::IntoMakeServiceWithConnectInfo;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use taskhub_ai::AiClient;
use taskhub_auth_core::{AuthService, HttpSmsGateway, LogSmsSender, SmsSender};
use taskhub_billing_core::PaymentService;
use taskhub_cache::{MemoryStore, RedisStore, Store};
use taskhub_db::pg::Repositories;
use taskhub_report_core::{ObjectStorage, ReportService};
use taskhub_todo_core::TodoService;

use crate::config::Config;
use crate::handlers::{health, ready};
use crate::rate_limit::{rate_limit, RateLimitPolicy};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("taskhub_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Taskhub API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(http_port = config.http_port, "Configuration loaded");

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Database pool and migrations
    let pool = taskhub_db::create_pool(&config.database_url).await?;
    sqlx::migrate!().run(&pool).await?;
    tracing::info!("Database pool created, migrations applied");

    // Repositories
    let repos = Repositories::new(pool.clone());

    // Cache store: Redis when configured, in-memory otherwise
    let store: Arc<dyn Store> = match &config.redis_url {
        Some(url) => {
            tracing::info!("Using Redis cache store");
            Arc::new(RedisStore::new(url)?)
        }
        None => {
            tracing::warn!("REDIS_URL not set, using in-memory cache store");
            Arc::new(MemoryStore::new())
        }
    };

    // SMS delivery
    let sms_sender: Arc<dyn SmsSender> = match &config.sms {
        Some(sms) => Arc::new(HttpSmsGateway::new(
            sms.endpoint.clone(),
            sms.api_key.clone(),
            sms.sign_name.clone(),
            sms.template_code.clone(),
        )),
        None => Arc::new(LogSmsSender),
    };

    // Object storage
    let storage = match config.storage.clone() {
        Some(storage_config) => {
            tracing::info!(bucket = %storage_config.bucket, "Object storage configured");
            Some(Arc::new(ObjectStorage::new(storage_config).await))
        }
        None => {
            tracing::warn!("S3_BUCKET not set, report PDFs served inline only");
            None
        }
    };

    // Core services
    let auth = AuthService::new(
        config.auth.clone(),
        Arc::new(repos.users.clone()),
        Arc::clone(&store),
        sms_sender,
    );
    let payments = PaymentService::new(
        config.billing.clone(),
        Arc::new(repos.users.clone()),
        Arc::new(repos.orders.clone()),
        Arc::clone(&store),
    );
    let todos = TodoService::new(Arc::new(repos.todos.clone()), Arc::clone(&store));
    let reports = ReportService::new(Arc::new(repos.reports.clone()), storage);
    let ai = AiClient::new(config.ai.clone());

    let state = AppState {
        auth: Arc::new(auth),
        payments: Arc::new(payments),
        todos: Arc::new(todos),
        reports: Arc::new(reports),
        ai: Arc::new(ai),
        repos,
        store,
        pool,
        config: Arc::new(config.clone()),
    };

    // Build HTTP router and serve
    let app = build_router(state, metrics_handle);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let service: IntoMakeServiceWithConnectInfo<Router, SocketAddr> =
        app.into_make_service_with_connect_info();

    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    // Auth routes: strict rate limit, mostly public
    let auth_routes = Router::new()
        .route("/register/email", post(handlers::auth::register_email))
        .route("/register/phone", post(handlers::auth::register_phone))
        .route("/login/email", post(handlers::auth::login_email))
        .route("/login/phone", post(handlers::auth::login_phone))
        .route("/login/sms", post(handlers::auth::login_sms))
        .route("/login/wechat", post(handlers::auth::login_wechat))
        .route("/login/google", post(handlers::auth::login_google))
        .route("/login/github", post(handlers::auth::login_github))
        .route("/sms/send", post(handlers::auth::send_sms_code))
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::me))
        .layer(middleware::from_fn_with_state(
            (state.clone(), RateLimitPolicy::AUTH),
            rate_limit,
        ));

    let user_routes = Router::new()
        .route(
            "/profile",
            get(handlers::user::get_profile).patch(handlers::user::update_profile),
        )
        .route("/subscription", get(handlers::user::get_subscription));

    let todo_routes = Router::new()
        .route(
            "/",
            get(handlers::todo::list_todos).post(handlers::todo::create_todo),
        )
        .route("/stats", get(handlers::todo::todo_stats))
        .route(
            "/{id}",
            get(handlers::todo::get_todo)
                .patch(handlers::todo::update_todo)
                .delete(handlers::todo::delete_todo),
        );

    let payment_routes = Router::new()
        .route("/plans", get(handlers::payment::list_plans))
        .route(
            "/orders",
            get(handlers::payment::list_orders).post(handlers::payment::create_order),
        )
        .route("/orders/{order_no}", get(handlers::payment::get_order))
        .route("/mock-pay", post(handlers::payment::mock_pay))
        .route("/alipay/notify", post(handlers::payment::alipay_notify))
        .route("/wechat/notify", post(handlers::payment::wechat_notify));

    let report_routes = Router::new()
        .route(
            "/",
            get(handlers::report::list_reports).post(handlers::report::create_report),
        )
        .route(
            "/{id}",
            get(handlers::report::get_report).delete(handlers::report::delete_report),
        )
        .route("/{id}/pdf", get(handlers::report::download_pdf))
        .route("/{id}/generate-pdf", post(handlers::report::generate_pdf));

    let ai_routes = Router::new()
        .route("/analyze", get(handlers::ai::analyze))
        .layer(middleware::from_fn_with_state(
            (state.clone(), RateLimitPolicy::AI),
            rate_limit,
        ));

    // General API traffic shares one window per client
    let api = Router::new()
        .nest("/user", user_routes)
        .nest("/todos", todo_routes)
        .nest("/payment", payment_routes)
        .nest("/reports", report_routes)
        .layer(middleware::from_fn_with_state(
            (state.clone(), RateLimitPolicy::API),
            rate_limit,
        ))
        .nest("/auth", auth_routes)
        .nest("/ai", ai_routes);

    // Webhook route (separate - raw body, no JSON parsing, no rate limit)
    let webhook_routes = Router::new().route(
        "/api/payment/stripe/webhook",
        post(handlers::webhook::stripe_webhook),
    );

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware_stack = ServiceBuilder::new()
        // Request ID propagation (outermost)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Tracing with request details
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // CORS
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Request timeout (innermost - closest to handler)
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api", api)
        .merge(webhook_routes)
        .layer(middleware_stack)
        .merge(health_routes) // Health routes without timeout
        .merge(metrics_route) // Metrics route without timeout
        .with_state(state)
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Most handlers are a couple of DB round trips; payment ops also
    // talk to providers
    let latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5];

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            latency_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full("payment_operation_duration_seconds".to_string()),
            latency_buckets,
        )?;

    let handle = builder.install_recorder()?;

    metrics::describe_counter!("auth_registrations_total", "Total registrations by method");
    metrics::describe_counter!("auth_sms_codes_sent_total", "Total SMS verification codes sent");
    metrics::describe_counter!("todos_created_total", "Total todos created");
    metrics::describe_counter!(
        "payment_orders_created_total",
        "Total orders created by payment method"
    );
    metrics::describe_counter!(
        "payment_completions_total",
        "Total completed payments by source"
    );
    metrics::describe_counter!(
        "payment_webhooks_processed_total",
        "Total webhooks processed by status"
    );
    metrics::describe_counter!("reports_created_total", "Total reports created");
    metrics::describe_counter!("report_pdfs_generated_total", "Total report PDFs generated");
    metrics::describe_counter!("ai_analyses_total", "Total AI analyses performed");
    metrics::describe_counter!("api_rate_limited_total", "Total rate-limited requests");
    metrics::describe_histogram!(
        "payment_operation_duration_seconds",
        "Payment operation latency in seconds by operation type"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
