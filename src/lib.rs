pub mod adapters;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod ports;
pub mod response;
pub mod services;

#[cfg(test)]
pub mod testing;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::SettlementService;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub settlement: SettlementService,
    pub config: Arc<Config>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/transactions",
            post(handlers::transactions::create_transaction)
                .get(handlers::transactions::list_transactions),
        )
        .route(
            "/transactions/:id",
            put(handlers::transactions::update_transaction_status),
        )
        .route(
            "/transactions/webhook",
            post(handlers::webhook::payment_callback),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
