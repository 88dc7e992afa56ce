pub mod auth;
pub mod signature;

pub use auth::{AuthUser, Claims};
pub use signature::VerifiedWebhook;
