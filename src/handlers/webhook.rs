//! Provider-invoked completion path. Authenticated by body signature, not
//! bearer token; collaborator calls fall back to the service token.

use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::domain::Transaction;
use crate::error::AppError;
use crate::middleware::VerifiedWebhook;
use crate::ports::Book;
use crate::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    pub transaction_id: i64,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub transaction: Transaction,
    pub book: Book,
}

pub async fn payment_callback(
    State(state): State<AppState>,
    webhook: VerifiedWebhook,
) -> Result<impl IntoResponse, AppError> {
    let req: WebhookRequest = serde_json::from_slice(&webhook.body)
        .map_err(|e| AppError::InvalidInput(format!("malformed webhook payload: {}", e)))?;

    let settled = state.settlement.settle(req.transaction_id, None).await?;

    Ok(Json(ApiResponse::new(
        "Transaction completed successfully",
        WebhookResponse {
            transaction: settled.transaction,
            book: settled.book,
        },
    )))
}
