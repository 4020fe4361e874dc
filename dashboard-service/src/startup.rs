//! Application startup and lifecycle management.

use crate::config::DashboardConfig;
use crate::handlers::{
    auth::{login_handler, logout_handler},
    health::{health_check, metrics_handler, readiness_check},
    invoices::{create_invoice, delete_invoice, get_invoice, list_invoices, update_invoice},
};
use crate::middleware::auth::auth_middleware;
use crate::services::{init_metrics, Database, HttpAuthProvider, RouteCache};
use crate::AppState;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::{request_id, request_id_middleware},
};
use std::sync::Arc;
use time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

/// Build the HTTP router over the given state.
pub fn build_router(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false) // Set to true in production with HTTPS
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    let dashboard = Router::new()
        .route("/dashboard/invoices", get(list_invoices))
        .route("/dashboard/invoices/create", post(create_invoice))
        .route("/dashboard/invoices/:id", get(get_invoice))
        .route("/dashboard/invoices/:id/edit", post(update_invoice))
        .route("/dashboard/invoices/:id/delete", post(delete_invoice))
        .route_layer(from_fn(auth_middleware));

    Router::new()
        .merge(dashboard)
        .route("/login", post(login_handler))
        .route("/logout", get(logout_handler))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    request_id = %request_id(request.headers()),
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Connect to the database, run migrations when configured and bind the listener.
    pub async fn build(config: DashboardConfig) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        if config.database.run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        let auth_provider = Arc::new(HttpAuthProvider::new(config.auth_provider.clone()));
        tracing::info!(provider_url = %auth_provider.base_url(), "Auth provider configured");

        let state = AppState::with_cache(
            Arc::new(db),
            auth_provider,
            config.auth_provider.strategy.clone(),
            RouteCache::with_max_pages(config.page_cache.max_pages),
        );

        let address = config.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, addr = %address, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until the shutdown future resolves.
    pub async fn run_until_stopped<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tracing::info!(
            service = "dashboard-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
