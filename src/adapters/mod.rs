pub mod book_client;
pub mod email_client;
mod http;
pub mod payment_client;
pub mod postgres_repository;
pub mod user_client;

pub use book_client::HttpBookStore;
pub use email_client::HttpNotifier;
pub use payment_client::HttpPaymentProvider;
pub use postgres_repository::PostgresTransactionRepository;
pub use user_client::HttpUserStore;
