//! Webhook body-signature verification.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEADER: &str = "X-Callback-Signature";

/// Extractor that verifies the payment provider's callback signature
/// (hex HMAC-SHA256 over the raw body) before the payload is parsed.
pub struct VerifiedWebhook {
    pub body: Vec<u8>,
}

impl VerifiedWebhook {
    /// Verify the signature using constant-time comparison.
    pub(crate) fn verify_signature(
        secret: &str,
        body: &[u8],
        signature_header: &str,
    ) -> Result<(), WebhookAuthError> {
        let expected = hex::decode(signature_header)
            .map_err(|_| WebhookAuthError::InvalidSignatureFormat)?;

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| WebhookAuthError::InvalidSecret)?;
        mac.update(body);

        mac.verify_slice(&expected)
            .map_err(|_| WebhookAuthError::SignatureMismatch)?;

        Ok(())
    }
}

#[async_trait]
impl FromRequest<AppState> for VerifiedWebhook {
    type Rejection = WebhookAuthError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let signature = req
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or(WebhookAuthError::MissingSignature)?;

        let body = axum::body::to_bytes(req.into_body(), usize::MAX)
            .await
            .map_err(|_| WebhookAuthError::BodyReadError)?
            .to_vec();

        Self::verify_signature(&state.config.payment_webhook_secret, &body, &signature)?;

        Ok(VerifiedWebhook { body })
    }
}

#[derive(Debug)]
pub enum WebhookAuthError {
    MissingSignature,
    InvalidSignatureFormat,
    InvalidSecret,
    SignatureMismatch,
    BodyReadError,
}

impl IntoResponse for WebhookAuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            WebhookAuthError::MissingSignature => {
                (StatusCode::UNAUTHORIZED, "Missing X-Callback-Signature header")
            }
            WebhookAuthError::InvalidSignatureFormat => {
                (StatusCode::UNAUTHORIZED, "Invalid signature format")
            }
            WebhookAuthError::InvalidSecret => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Invalid webhook secret configuration",
            ),
            WebhookAuthError::SignatureMismatch => {
                (StatusCode::UNAUTHORIZED, "Signature verification failed")
            }
            WebhookAuthError::BodyReadError => {
                (StatusCode::BAD_REQUEST, "Failed to read request body")
            }
        };

        tracing::warn!("Webhook authentication failed: {:?}", self);
        (status, message).into_response()
    }
}
