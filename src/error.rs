use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::ports::ClientError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Book {0} not found")]
    BookNotFound(i64),

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i32, available: i32 },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Transaction {0} already settled")]
    AlreadySettled(i64),

    #[error("Transaction {0} has expired")]
    Expired(i64),

    #[error("Payment provider error: {0}")]
    PaymentProvider(String),

    #[error("Upstream call failed: {0}")]
    Upstream(#[from] ClientError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidInput(_)
            | AppError::BookNotFound(_)
            | AppError::InsufficientStock { .. }
            | AppError::Expired(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::AlreadySettled(_) => StatusCode::CONFLICT,
            AppError::PaymentProvider(_) | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "message": self.to_string(),
            "data": null,
        }));

        (status, body).into_response()
    }
}
