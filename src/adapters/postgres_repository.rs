//! Postgres implementation of TransactionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{NewTransaction, Transaction, TransactionStatus};
use crate::ports::TransactionRepository;

/// Postgres-backed transaction store. The only writer of transaction rows.
#[derive(Clone)]
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn insert(&self, draft: &NewTransaction) -> Result<Transaction, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (user_id, book_id, quantity, amount, status, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(draft.user_id)
        .bind(draft.book_id)
        .bind(draft.quantity)
        .bind(&draft.amount)
        .bind(TransactionStatus::Pending)
        .bind(draft.expires_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Transaction>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Transaction>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE user_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn claim_success(&self, id: i64) -> Result<bool, sqlx::Error> {
        // Conditional transition: affected-row count decides the winner
        // between concurrent completions of the same transaction.
        let result = sqlx::query(
            r#"
            UPDATE transactions SET status = $1
            WHERE id = $2 AND status = $3 AND deleted_at IS NULL
            "#,
        )
        .bind(TransactionStatus::Success)
        .bind(id)
        .bind(TransactionStatus::Pending)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_expired_failed(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE transactions SET status = $1
            WHERE status = $2 AND expires_at < $3 AND deleted_at IS NULL
            "#,
        )
        .bind(TransactionStatus::Fail)
        .bind(TransactionStatus::Pending)
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn reap_expired_failed(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE transactions SET deleted_at = now()
            WHERE status = $1 AND expires_at < $2 AND deleted_at IS NULL
            "#,
        )
        .bind(TransactionStatus::Fail)
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
