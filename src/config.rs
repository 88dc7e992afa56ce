use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub book_service_url: String,
    pub auth_service_url: String,
    pub email_service_url: String,
    pub payment_base_url: String,
    pub payment_server_key: String,
    pub payment_webhook_secret: String,
    pub jwt_secret: String,
    /// Token used on collaborator calls when there is no caller token to
    /// forward (webhook-driven settlement).
    pub service_token: Option<String>,
    pub transaction_ttl_hours: i64,
    /// Six-field cron expression for the expiry sweeper.
    pub sweeper_schedule: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8082".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")?,
            book_service_url: env::var("BOOK_SERVICE_URL")
                .unwrap_or_else(|_| "http://book-service:8081".to_string()),
            auth_service_url: env::var("AUTH_SERVICE_URL")
                .unwrap_or_else(|_| "http://auth-service:8080".to_string()),
            email_service_url: env::var("EMAIL_SERVICE_URL")
                .unwrap_or_else(|_| "http://email-service:8084".to_string()),
            payment_base_url: env::var("PAYMENT_BASE_URL")?,
            payment_server_key: env::var("PAYMENT_SERVER_KEY")?,
            payment_webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET")?,
            jwt_secret: env::var("JWT_SECRET")?,
            service_token: env::var("SERVICE_TOKEN").ok(),
            transaction_ttl_hours: env::var("TRANSACTION_TTL_HOURS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()?,
            sweeper_schedule: env::var("SWEEPER_SCHEDULE")
                .unwrap_or_else(|_| "0 0 0 * * *".to_string()),
        })
    }
}
