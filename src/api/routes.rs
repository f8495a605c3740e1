use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::services::WalletService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<WalletService>,
    /// Present when backed by Postgres; drives the readiness probe.
    pub pool: Option<PgPool>,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(service: Arc<WalletService>) -> Self {
        Self {
            service,
            pool: None,
            metrics_handle: None,
        }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}

/// Creates the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/live", get(handlers::liveness_check))
        // Metrics endpoint
        .route("/metrics", get(handlers::metrics_endpoint))
        // Wallet provisioning (called by the user service at signup)
        .route("/wallets", post(handlers::create_wallet))
        // Wallet endpoints
        .route("/wallet/balance", get(handlers::get_balance))
        .route("/wallet/deposit", post(handlers::initiate_deposit))
        .route(
            "/wallet/deposit/:reference/status",
            get(handlers::get_deposit_status),
        )
        .route("/wallet/paystack/webhook", post(handlers::paystack_webhook))
        .route("/wallet/transfer", post(handlers::transfer))
        .route("/wallet/transactions", get(handlers::get_transactions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
