//! Settlement orchestrator.
//!
//! Drives a transaction through its lifecycle: creation with payment
//! handoff, and completion (stock deduction, seller balance credit, buyer
//! notification). Both the authenticated status-update endpoint and the
//! provider webhook converge on [`SettlementService::settle`].

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::domain::{NewTransaction, Transaction, TransactionStatus};
use crate::error::AppError;
use crate::ports::{
    Book, BookStore, ClientError, Notifier, PaymentHandoff, PaymentProvider, PurchaseNotice,
    TransactionRepository, UserStore,
};

/// Identity of the purchasing user, resolved from bearer claims.
#[derive(Debug, Clone)]
pub struct Buyer {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug)]
pub struct CreatedTransaction {
    pub transaction: Transaction,
    pub payment: PaymentHandoff,
}

#[derive(Debug)]
pub struct SettledTransaction {
    pub transaction: Transaction,
    pub book: Book,
}

#[derive(Clone)]
pub struct SettlementService {
    repo: Arc<dyn TransactionRepository>,
    books: Arc<dyn BookStore>,
    users: Arc<dyn UserStore>,
    payments: Arc<dyn PaymentProvider>,
    notifier: Arc<dyn Notifier>,
    ttl: Duration,
}

impl SettlementService {
    pub fn new(
        repo: Arc<dyn TransactionRepository>,
        books: Arc<dyn BookStore>,
        users: Arc<dyn UserStore>,
        payments: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn Notifier>,
        ttl: Duration,
    ) -> Self {
        Self {
            repo,
            books,
            users,
            payments,
            notifier,
            ttl,
        }
    }

    /// Creates a pending transaction and requests a payment handoff.
    ///
    /// The amount snapshots the book's unit cost; stock and balance are not
    /// touched until settlement. If the provider call fails the pending row
    /// is kept and the expiry sweeper reaps it after the TTL.
    pub async fn create_transaction(
        &self,
        buyer: &Buyer,
        book_id: i64,
        quantity: i32,
        bearer: &str,
    ) -> Result<CreatedTransaction, AppError> {
        if quantity <= 0 {
            return Err(AppError::InvalidInput(
                "quantity must be greater than 0".to_string(),
            ));
        }

        let book = self.lookup_book(book_id, Some(bearer)).await?;

        if quantity > book.stock {
            return Err(AppError::InsufficientStock {
                requested: quantity,
                available: book.stock,
            });
        }

        let draft = NewTransaction::purchase(buyer.id, book_id, quantity, &book.cost, self.ttl);
        let transaction = self.repo.insert(&draft).await?;
        info!(
            transaction_id = transaction.id,
            book_id,
            quantity,
            amount = %transaction.amount,
            "transaction created"
        );

        let payment = self
            .payments
            .create_handoff(
                &transaction.order_ref(),
                &transaction.amount,
                &buyer.name,
                &buyer.email,
            )
            .await
            .map_err(|e| {
                warn!(
                    transaction_id = transaction.id,
                    "payment handoff failed, row left pending for the sweeper: {}", e
                );
                AppError::PaymentProvider(e.to_string())
            })?;

        Ok(CreatedTransaction {
            transaction,
            payment,
        })
    }

    /// Lists the buyer's live transactions, newest first.
    pub async fn list_transactions(&self, user_id: i64) -> Result<Vec<Transaction>, AppError> {
        Ok(self.repo.list_for_user(user_id).await?)
    }

    /// Settles a paid transaction.
    ///
    /// Claims the `pending -> success` transition with a conditional update
    /// first; only the claim winner applies the downstream effects, so the
    /// balance credit and stock deduction run at most once per transaction.
    /// A downstream failure after the claim is surfaced to the caller and
    /// logged, not compensated.
    pub async fn settle(
        &self,
        id: i64,
        bearer: Option<&str>,
    ) -> Result<SettledTransaction, AppError> {
        let mut transaction = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("transaction {}", id)))?;

        match transaction.status {
            TransactionStatus::Success => return Err(AppError::AlreadySettled(id)),
            TransactionStatus::Fail => return Err(AppError::Expired(id)),
            TransactionStatus::Pending => {}
        }

        // Seller identity comes from the book record.
        let book = self.lookup_book(transaction.book_id, bearer).await?;

        if !self.repo.claim_success(id).await? {
            // Lost the race to a concurrent completion.
            return Err(AppError::AlreadySettled(id));
        }
        transaction.status = TransactionStatus::Success;
        info!(transaction_id = id, "transaction marked success");

        self.users
            .credit_balance(book.seller_id, &transaction.amount)
            .await
            .map_err(|e| self.settlement_gap(id, "balance credit", e))?;

        self.books
            .deduct_stock(transaction.book_id, transaction.quantity, bearer)
            .await
            .map_err(|e| self.settlement_gap(id, "stock deduction", e))?;

        self.notify_buyer(&transaction).await;

        Ok(SettledTransaction { transaction, book })
    }

    async fn lookup_book(&self, book_id: i64, bearer: Option<&str>) -> Result<Book, AppError> {
        let book = self
            .books
            .get_book(book_id, bearer)
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => AppError::BookNotFound(book_id),
                other => AppError::Upstream(other),
            })?;

        // Some book-service deployments answer 200 with a zero record
        if book.id == 0 {
            return Err(AppError::BookNotFound(book_id));
        }
        Ok(book)
    }

    fn settlement_gap(&self, id: i64, step: &str, e: ClientError) -> AppError {
        warn!(
            transaction_id = id,
            "{} failed after success was recorded: {}", step, e
        );
        AppError::Upstream(e)
    }

    /// Best-effort purchase notification; failures are logged, never
    /// surfaced to the settlement caller.
    async fn notify_buyer(&self, transaction: &Transaction) {
        let user = match self.users.get_user(transaction.user_id).await {
            Ok(user) => user,
            Err(e) => {
                warn!(
                    transaction_id = transaction.id,
                    "buyer lookup for notification failed: {}", e
                );
                return;
            }
        };

        let notice = PurchaseNotice {
            email: user.email,
            transaction_id: transaction.id.to_string(),
            product: "preloved book".to_string(),
            amount: transaction.amount.clone(),
            status: "success".to_string(),
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            invoice_url: String::new(),
        };

        if let Err(e) = self.notifier.purchase_completed(&notice).await {
            warn!(
                transaction_id = transaction.id,
                "purchase notification failed: {}", e
            );
        }
    }
}
