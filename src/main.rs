use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use sqlx::migrate::Migrator;
use tokio::net::TcpListener;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use preloved_settlement::adapters::{
    HttpBookStore, HttpNotifier, HttpPaymentProvider, HttpUserStore, PostgresTransactionRepository,
};
use preloved_settlement::jobs::ExpirySweeper;
use preloved_settlement::services::SettlementService;
use preloved_settlement::{AppState, config, create_app, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::Config::from_env()?;

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database pool
    let pool = db::create_pool(&config).await?;

    // Run migrations
    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("Database migrations completed");

    let repo = Arc::new(PostgresTransactionRepository::new(pool.clone()));
    let books = Arc::new(HttpBookStore::new(
        config.book_service_url.clone(),
        config.service_token.clone(),
    ));
    let users = Arc::new(HttpUserStore::new(config.auth_service_url.clone()));
    let payments = Arc::new(HttpPaymentProvider::new(
        config.payment_base_url.clone(),
        config.payment_server_key.clone(),
    ));
    let notifier = Arc::new(HttpNotifier::new(config.email_service_url.clone()));

    let settlement = SettlementService::new(
        repo.clone(),
        books,
        users,
        payments,
        notifier,
        chrono::Duration::hours(config.transaction_ttl_hours),
    );

    let sweeper = ExpirySweeper::new(repo, &config.sweeper_schedule)?;
    sweeper.start();
    tracing::info!(schedule = %config.sweeper_schedule, "Expiry sweeper started");

    let port = config.server_port;
    let app_state = AppState {
        db: pool,
        settlement,
        config: Arc::new(config),
    };

    let app = create_app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
