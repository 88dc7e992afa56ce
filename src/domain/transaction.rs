//! Transaction domain entity.
//! Framework-agnostic representation of a book purchase.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a transaction. Transitions only `pending -> success`
/// (settlement) or `pending -> fail` (expiry); both are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Success,
    Fail,
}

/// A persisted purchase transaction.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Transaction {
    #[serde(rename = "transaction_id")]
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub quantity: i32,
    pub amount: BigDecimal,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn is_settled(&self) -> bool {
        self.status != TransactionStatus::Pending
    }

    /// Order reference sent to the payment provider. The timestamp suffix
    /// keeps references unique if a handoff is re-requested for the same row.
    pub fn order_ref(&self) -> String {
        format!("{}-{}", self.id, Utc::now().timestamp())
    }
}

/// Draft transaction before the store assigns an ID and creation time.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: i64,
    pub book_id: i64,
    pub quantity: i32,
    pub amount: BigDecimal,
    pub expires_at: DateTime<Utc>,
}

impl NewTransaction {
    /// Builds a purchase draft. The amount snapshots the unit cost at
    /// creation time; later price changes do not affect settlement.
    pub fn purchase(
        user_id: i64,
        book_id: i64,
        quantity: i32,
        unit_cost: &BigDecimal,
        ttl: Duration,
    ) -> Self {
        Self {
            user_id,
            book_id,
            quantity,
            amount: BigDecimal::from(quantity) * unit_cost,
            expires_at: Utc::now() + ttl,
        }
    }
}
