//! In-memory fakes and token helpers shared by unit and router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::AppState;
use crate::config::Config;
use crate::domain::{NewTransaction, Transaction, TransactionStatus};
use crate::middleware::Claims;
use crate::ports::{
    Book, BookStore, ClientError, Notifier, PaymentHandoff, PaymentProvider, PurchaseNotice,
    TransactionRepository, User, UserStore,
};
use crate::services::SettlementService;

pub fn sample_book() -> Book {
    Book {
        id: 7,
        seller_id: 2,
        name: "Dune".to_string(),
        stock: 5,
        cost: "25.50".parse().unwrap(),
    }
}

pub fn make_token(secret: &str, user_id: i64, name: &str, email: &str, expired: bool) -> String {
    let exp = if expired {
        Utc::now() - Duration::hours(1)
    } else {
        Utc::now() + Duration::hours(1)
    };

    let claims = Claims {
        user_id,
        full_name: name.to_string(),
        email: email.to_string(),
        exp: exp.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn sign_body(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[derive(Default)]
pub struct InMemoryRepo {
    rows: Mutex<HashMap<i64, Transaction>>,
    next_id: AtomicI64,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn seed(&self, status: TransactionStatus, expires_at: DateTime<Utc>) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().unwrap().insert(
            id,
            Transaction {
                id,
                user_id: 1,
                book_id: 7,
                quantity: 1,
                amount: BigDecimal::from(25),
                status,
                created_at: Utc::now(),
                expires_at,
                deleted_at: None,
            },
        );
        id
    }

    /// Live view, as the repository queries see it.
    pub fn get(&self, id: i64) -> Option<Transaction> {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .filter(|t| t.deleted_at.is_none())
            .cloned()
    }

    /// Includes tombstoned rows.
    pub fn raw_get(&self, id: i64) -> Option<Transaction> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn set_status(&self, id: i64, status: TransactionStatus) {
        if let Some(row) = self.rows.lock().unwrap().get_mut(&id) {
            row.status = status;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().unwrap().is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryRepo {
    async fn insert(&self, draft: &NewTransaction) -> Result<Transaction, sqlx::Error> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let transaction = Transaction {
            id,
            user_id: draft.user_id,
            book_id: draft.book_id,
            quantity: draft.quantity,
            amount: draft.amount.clone(),
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
            expires_at: draft.expires_at,
            deleted_at: None,
        };
        self.rows.lock().unwrap().insert(id, transaction.clone());
        Ok(transaction)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Transaction>, sqlx::Error> {
        Ok(self.get(id))
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Transaction>, sqlx::Error> {
        let mut rows: Vec<Transaction> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.user_id == user_id && t.deleted_at.is_none())
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn claim_success(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(row) if row.status == TransactionStatus::Pending && row.deleted_at.is_none() => {
                row.status = TransactionStatus::Success;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_expired_failed(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let mut count = 0;
        for row in self.rows.lock().unwrap().values_mut() {
            if row.status == TransactionStatus::Pending
                && row.expires_at < cutoff
                && row.deleted_at.is_none()
            {
                row.status = TransactionStatus::Fail;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn reap_expired_failed(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let mut count = 0;
        for row in self.rows.lock().unwrap().values_mut() {
            if row.status == TransactionStatus::Fail
                && row.expires_at < cutoff
                && row.deleted_at.is_none()
            {
                row.deleted_at = Some(Utc::now());
                count += 1;
            }
        }
        Ok(count)
    }
}

pub struct FakeBookStore {
    book: Mutex<Option<Book>>,
    deductions: Mutex<Vec<(i64, i32)>>,
}

impl FakeBookStore {
    pub fn new() -> Self {
        Self {
            book: Mutex::new(Some(sample_book())),
            deductions: Mutex::new(Vec::new()),
        }
    }

    pub fn set_book(&self, book: Book) {
        *self.book.lock().unwrap() = Some(book);
    }

    pub fn clear_book(&self) {
        *self.book.lock().unwrap() = None;
    }

    pub fn deductions(&self) -> Vec<(i64, i32)> {
        self.deductions.lock().unwrap().clone()
    }
}

#[async_trait]
impl BookStore for FakeBookStore {
    async fn get_book(&self, _id: i64, _bearer: Option<&str>) -> Result<Book, ClientError> {
        self.book
            .lock()
            .unwrap()
            .clone()
            .ok_or(ClientError::Status {
                service: "book-service",
                status: 404,
                body: String::new(),
            })
    }

    async fn deduct_stock(
        &self,
        id: i64,
        quantity: i32,
        _bearer: Option<&str>,
    ) -> Result<(), ClientError> {
        self.deductions.lock().unwrap().push((id, quantity));
        Ok(())
    }
}

pub struct FakeUserStore {
    credits: Mutex<Vec<(i64, BigDecimal)>>,
    fail_credit: AtomicBool,
}

impl FakeUserStore {
    pub fn new() -> Self {
        Self {
            credits: Mutex::new(Vec::new()),
            fail_credit: AtomicBool::new(false),
        }
    }

    pub fn fail_credit(&self) {
        self.fail_credit.store(true, Ordering::SeqCst);
    }

    pub fn credits(&self) -> Vec<(i64, BigDecimal)> {
        self.credits.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserStore for FakeUserStore {
    async fn get_user(&self, id: i64) -> Result<User, ClientError> {
        Ok(User {
            id,
            fullname: "Jane Seller".to_string(),
            email: "jane@example.com".to_string(),
        })
    }

    async fn credit_balance(&self, id: i64, amount: &BigDecimal) -> Result<(), ClientError> {
        if self.fail_credit.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                service: "auth-service",
                status: 500,
                body: String::new(),
            });
        }
        self.credits.lock().unwrap().push((id, amount.clone()));
        Ok(())
    }
}

pub struct FakePaymentProvider {
    fail: AtomicBool,
}

impl FakePaymentProvider {
    pub fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentProvider for FakePaymentProvider {
    async fn create_handoff(
        &self,
        _order_ref: &str,
        _amount: &BigDecimal,
        _customer_name: &str,
        _customer_email: &str,
    ) -> Result<PaymentHandoff, ClientError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::InvalidResponse(
                "payment-provider",
                "gross_amount is invalid".to_string(),
            ));
        }
        Ok(PaymentHandoff {
            token: "snap-token-123".to_string(),
            redirect_url: "https://pay.example.com/redir/snap-token-123".to_string(),
        })
    }
}

pub struct FakeNotifier {
    notices: Mutex<Vec<PurchaseNotice>>,
    fail: AtomicBool,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn notices(&self) -> Vec<PurchaseNotice> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn purchase_completed(&self, notice: &PurchaseNotice) -> Result<(), ClientError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                service: "email-service",
                status: 500,
                body: String::new(),
            });
        }
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

/// One fake of everything the orchestrator touches.
pub struct FakeWorld {
    pub repo: Arc<InMemoryRepo>,
    pub books: Arc<FakeBookStore>,
    pub users: Arc<FakeUserStore>,
    pub payments: Arc<FakePaymentProvider>,
    pub notifier: Arc<FakeNotifier>,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryRepo::new()),
            books: Arc::new(FakeBookStore::new()),
            users: Arc::new(FakeUserStore::new()),
            payments: Arc::new(FakePaymentProvider::new()),
            notifier: Arc::new(FakeNotifier::new()),
        }
    }

    pub fn service(&self) -> SettlementService {
        SettlementService::new(
            self.repo.clone(),
            self.books.clone(),
            self.users.clone(),
            self.payments.clone(),
            self.notifier.clone(),
            Duration::hours(4),
        )
    }

    pub fn app_state(&self) -> AppState {
        let config = Config {
            server_port: 0,
            database_url: "postgres://postgres@localhost/unused".to_string(),
            book_service_url: "http://book-service:8081".to_string(),
            auth_service_url: "http://auth-service:8080".to_string(),
            email_service_url: "http://email-service:8084".to_string(),
            payment_base_url: "https://pay.example.com".to_string(),
            payment_server_key: "server-key".to_string(),
            payment_webhook_secret: "hook-secret".to_string(),
            jwt_secret: "test_secret_key".to_string(),
            service_token: None,
            transaction_ttl_hours: 4,
            sweeper_schedule: "0 0 0 * * *".to_string(),
        };

        let db = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .expect("lazy pool");

        AppState {
            db,
            settlement: self.service(),
            config: Arc::new(config),
        }
    }
}
