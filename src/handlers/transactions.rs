//! Authenticated transaction endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::ports::PaymentHandoff;
use crate::response::ApiResponse;
use crate::services::Buyer;

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub book_id: i64,
    pub qty: i32,
}

#[derive(Debug, Serialize)]
pub struct CreateTransactionResponse {
    pub transaction_id: i64,
    pub payment: PaymentHandoff,
}

impl From<&AuthUser> for Buyer {
    fn from(user: &AuthUser) -> Self {
        Buyer {
            id: user.claims.user_id,
            name: user.claims.full_name.clone(),
            email: user.claims.email.clone(),
        }
    }
}

pub async fn create_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = state
        .settlement
        .create_transaction(&Buyer::from(&user), req.book_id, req.qty, &user.token)
        .await?;

    let body = ApiResponse::new(
        "Transaction created successfully",
        CreateTransactionResponse {
            transaction_id: created.transaction.id,
            payment: created.payment,
        },
    );

    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let transactions = state
        .settlement
        .list_transactions(user.claims.user_id)
        .await?;

    Ok(Json(ApiResponse::new(
        "Transactions retrieved successfully",
        transactions,
    )))
}

pub async fn update_transaction_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let settled = state.settlement.settle(id, Some(&user.token)).await?;

    Ok(Json(ApiResponse::new(
        "Transaction status updated successfully",
        settled.transaction,
    )))
}
