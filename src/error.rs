use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Insufficient stock")]
    InsufficientStock,

    #[error("Product is unavailable")]
    ProductUnavailable,

    #[error("No checked items in cart")]
    NoCheckedItems,

    #[error("Address not found")]
    AddressNotFound,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Invalid order status")]
    InvalidOrderStatus,

    #[error("Order cannot be cancelled")]
    OrderCannotBeCancelled,

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable code returned to clients alongside the HTTP status.
    pub fn code(&self) -> u32 {
        match self {
            AppError::BadRequest(_) => 400,
            AppError::Unauthorized => 401,
            AppError::Forbidden => 403,
            AppError::ProductNotFound => 40101,
            AppError::InsufficientStock => 40103,
            AppError::ProductUnavailable => 40104,
            AppError::NoCheckedItems => 40303,
            AppError::AddressNotFound => 40401,
            AppError::OrderNotFound => 40501,
            AppError::InvalidOrderStatus => 40502,
            AppError::OrderCannotBeCancelled => 40503,
            AppError::OrmError(_) | AppError::Internal(_) => 500,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::ProductNotFound | AppError::AddressNotFound | AppError::OrderNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::InsufficientStock
            | AppError::ProductUnavailable
            | AppError::NoCheckedItems
            | AppError::InvalidOrderStatus
            | AppError::OrderCannotBeCancelled => StatusCode::CONFLICT,
            AppError::OrmError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorData {
    pub code: u32,
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::OrmError(err) => tracing::error!(error = ?err, "database failure"),
            AppError::Internal(err) => tracing::error!(error = ?err, "internal failure"),
            _ => {}
        }

        // Display strings of the infra variants carry no cause.
        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                code: self.code(),
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_keep_distinct_codes() {
        let errors = [
            AppError::ProductNotFound,
            AppError::InsufficientStock,
            AppError::ProductUnavailable,
            AppError::NoCheckedItems,
            AppError::AddressNotFound,
            AppError::OrderNotFound,
            AppError::InvalidOrderStatus,
            AppError::OrderCannotBeCancelled,
            AppError::Forbidden,
        ];
        let mut codes: Vec<u32> = errors.iter().map(AppError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn infrastructure_errors_are_opaque() {
        let err = AppError::OrmError(sea_orm::DbErr::Custom("relation \"orders\" is locked".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("orders"));
    }
}
