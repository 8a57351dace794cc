//! Inventory Error Types
//!
//! Inventory-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::access::AccessDenied;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Inventory-specific result type alias
pub type InventoryResult<T> = Result<T, InventoryError>;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Product not found")]
    ProductNotFound,

    /// Zero, negative or out-of-range quantity
    #[error("Quantity must be a positive whole number")]
    InvalidQuantity,

    /// Outgoing movement larger than the stock on hand
    #[error("Insufficient stock: {available} unit(s) available")]
    InsufficientStock { available: i64 },

    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    #[error("Product has stock transactions and cannot be deleted")]
    ProductHasTransactions,

    #[error("You do not have permission to perform this action")]
    Forbidden(#[from] AccessDenied),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl InventoryError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            InventoryError::ProductNotFound => ErrorKind::NotFound,
            InventoryError::InvalidQuantity | InventoryError::InvalidProduct(_) => {
                ErrorKind::BadRequest
            }
            InventoryError::InsufficientStock { .. } | InventoryError::ProductHasTransactions => {
                ErrorKind::Conflict
            }
            InventoryError::Forbidden(_) => ErrorKind::Forbidden,
            InventoryError::Database(_) | InventoryError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            InventoryError::Database(_) | InventoryError::Internal(_) => {
                AppError::internal("An internal error occurred")
            }
            InventoryError::InsufficientStock { .. } => {
                AppError::new(self.kind(), self.to_string())
                    .with_action("Reduce the quantity or record incoming stock first")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            InventoryError::Database(e) => {
                tracing::error!(error = %e, "Inventory database error");
            }
            InventoryError::Internal(msg) => {
                tracing::error!(message = %msg, "Inventory internal error");
            }
            InventoryError::Forbidden(denied) => {
                tracing::warn!(
                    role = %denied.role,
                    permission = %denied.permission,
                    "Access denied"
                );
            }
            _ => {
                tracing::debug!(error = %self, "Inventory error");
            }
        }
    }
}

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        err.to_app_error()
    }
}

impl IntoResponse for InventoryError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
