//! Seams between the orchestrator and its collaborators.
//!
//! Each external service the settlement flow touches sits behind a trait so
//! the orchestrator can be exercised against in-memory fakes. HTTP and
//! Postgres implementations live under `adapters`.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{NewTransaction, Transaction};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{service} returned status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("invalid response from {0}: {1}")]
    InvalidResponse(&'static str, String),

    #[error("circuit breaker open for {0}")]
    CircuitOpen(&'static str),
}

impl ClientError {
    /// Transient failures are safe to retry for read-only calls.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Request(e) => e.is_timeout() || e.is_connect(),
            ClientError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { status: 404, .. })
    }
}

/// Book listing as served by the book service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub seller_id: i64,
    pub name: String,
    pub stock: i32,
    #[serde(rename = "costs")]
    pub cost: BigDecimal,
}

/// User record as served by the auth service. Only the fields the
/// settlement flow needs.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub fullname: String,
    pub email: String,
}

/// Opaque payment artifact the buyer's client uses to complete payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentHandoff {
    pub token: String,
    pub redirect_url: String,
}

/// Payload for the purchase-success notification email.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseNotice {
    pub email: String,
    pub transaction_id: String,
    pub product: String,
    pub amount: BigDecimal,
    pub status: String,
    pub timestamp: String,
    pub invoice_url: String,
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn insert(&self, draft: &NewTransaction) -> Result<Transaction, sqlx::Error>;

    /// Fetches a live (non-tombstoned) transaction.
    async fn get_by_id(&self, id: i64) -> Result<Option<Transaction>, sqlx::Error>;

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Transaction>, sqlx::Error>;

    /// Conditional `pending -> success` transition. Returns false when the
    /// row was not pending, so concurrent completions have a single winner.
    async fn claim_success(&self, id: i64) -> Result<bool, sqlx::Error>;

    /// Sweep phase 1: pending rows past expiry become `fail`.
    async fn mark_expired_failed(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error>;

    /// Sweep phase 2: failed rows past expiry are tombstoned.
    async fn reap_expired_failed(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error>;
}

#[async_trait]
pub trait BookStore: Send + Sync {
    /// Looks a book up, forwarding the caller's bearer token when present.
    async fn get_book(&self, id: i64, bearer: Option<&str>) -> Result<Book, ClientError>;

    /// Deducts `quantity` from the book's stock. The book service guards
    /// the decrement; this call is issued at most once per settlement.
    async fn deduct_stock(
        &self,
        id: i64,
        quantity: i32,
        bearer: Option<&str>,
    ) -> Result<(), ClientError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: i64) -> Result<User, ClientError>;

    /// Credits `amount` onto the user's balance (delta semantics).
    async fn credit_balance(&self, id: i64, amount: &BigDecimal) -> Result<(), ClientError>;
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_handoff(
        &self,
        order_ref: &str,
        amount: &BigDecimal,
        customer_name: &str,
        customer_email: &str,
    ) -> Result<PaymentHandoff, ClientError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn purchase_completed(&self, notice: &PurchaseNotice) -> Result<(), ClientError>;
}
