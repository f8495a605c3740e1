use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use wallet_engine::api::{create_router, AppState};
use wallet_engine::config::Settings;
use wallet_engine::gateway::PaystackClient;
use wallet_engine::observability::{init_logging, init_metrics, LogConfig};
use wallet_engine::repositories::PgLedgerStore;
use wallet_engine::services::WalletService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()?;

    init_logging(&LogConfig {
        level: settings.application.log_level.clone(),
        ..LogConfig::default()
    });
    info!("Configuration loaded");

    let pool = PgPoolOptions::new()
        .max_connections(settings.database.pool_size)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&settings.database.url)
        .await?;
    info!("Database connection established");

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations applied");

    let metrics_handle = init_metrics()?;

    let store = Arc::new(PgLedgerStore::new(pool.clone()));
    let gateway = Arc::new(PaystackClient::new(
        settings.paystack.base_url.clone(),
        settings.paystack.secret_key.clone(),
    ));
    let service = Arc::new(WalletService::new(
        store,
        gateway,
        settings.paystack.secret_key.clone(),
        settings.application.base_url.clone(),
    ));

    let state = AppState::new(service)
        .with_pool(pool)
        .with_metrics(metrics_handle);
    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind(("0.0.0.0", settings.application.port)).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
