//! # API Error Type
//!
//! Unified error type for storefront handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Bulkbuy                                │
//! │                                                                         │
//! │  Handler (price_cart, create_order, ...)                               │
//! │  Result<T, ApiError>                                                   │
//! │         │                                                               │
//! │         ├── DbError ─────────── internals logged, generic message ─┐   │
//! │         ├── CoreError ───────── pricing / stock / not found ───────┤   │
//! │         ├── ValidationError ─── bad request input ─────────────────┤   │
//! │         └── PaymentError ────── gateway refused ───────────────────┤   │
//! │                                                                     ▼   │
//! │                                           { "code": "...",             │
//! │                                             "message": "..." }         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A transport layer maps [`ErrorCode::status`] onto its own status codes.

use bulkbuy_core::{CoreError, ValidationError};
use bulkbuy_db::{ConstraintKind, DbError};
use serde::Serialize;

use crate::payment::PaymentError;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NO_APPLICABLE_TIER",
///   "message": "No applicable pricing tier found for quantity: 0"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Pricing input missing or unrepresentable (400)
    InvalidInput,

    /// Quantity not covered by any tier (422)
    NoApplicableTier,

    /// Requested quantity exceeds stock (409)
    InsufficientStock,

    /// Payment processing error (502)
    PaymentError,

    /// Database operation failed (500)
    DatabaseError,
}

impl ErrorCode {
    /// HTTP-style status for this code.
    pub const fn status(&self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::ValidationError | ErrorCode::InvalidInput => 400,
            ErrorCode::NoApplicableTier => 422,
            ErrorCode::InsufficientStock => 409,
            ErrorCode::PaymentError => 502,
            ErrorCode::DatabaseError => 500,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// HTTP-style status for this error.
    pub fn status(&self) -> u16 {
        self.code.status()
    }
}

/// Converts database errors to API errors.
///
/// Only caller mistakes keep their message; storage failures are logged
/// and replaced with a generic one.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::Invalid(e) => ApiError::validation(e.to_string()),
            DbError::Constraint {
                kind: ConstraintKind::Unique,
                ..
            } => ApiError::validation("A record with the same key already exists"),
            DbError::Constraint {
                kind: ConstraintKind::ForeignKey,
                ..
            } => ApiError::validation("Invalid reference"),
            DbError::PoolTimedOut => {
                tracing::warn!("Database pool timed out");
                ApiError::new(ErrorCode::DatabaseError, "Database is busy, try again")
            }
            other => {
                tracing::error!(error = %other, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::InvalidInput(_) => ApiError::new(ErrorCode::InvalidInput, message),
            CoreError::NoApplicableTier { .. } => {
                ApiError::new(ErrorCode::NoApplicableTier, message)
            }
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::OrderNotFound(id) => ApiError::not_found("Order", &id),
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, message)
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        tracing::warn!(error = %err, "Payment intent rejected");
        ApiError::new(ErrorCode::PaymentError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_keep_their_kind() {
        let err: ApiError = CoreError::NoApplicableTier { quantity: 0 }.into();
        assert_eq!(err.code, ErrorCode::NoApplicableTier);
        assert_eq!(err.status(), 422);
        assert_eq!(
            err.message,
            "No applicable pricing tier found for quantity: 0"
        );

        let err: ApiError = CoreError::invalid_input("No pricing tiers available").into();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_not_found_mapping() {
        let err: ApiError = CoreError::ProductNotFound("p-9".to_string()).into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Product not found: p-9");

        let err: ApiError = DbError::not_found("Order", "o-1").into();
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn test_db_internals_are_hidden() {
        let err: ApiError = DbError::Query("near \"SELEC\": syntax error".to_string()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database operation failed");
    }

    #[test]
    fn test_serialization() {
        let err = ApiError::not_found("Order", "o-1");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Order not found: o-1");
    }

    #[test]
    fn test_payment_error_mapping() {
        let err: ApiError = PaymentError::InvalidAmount(0).into();
        assert_eq!(err.code, ErrorCode::PaymentError);
        assert_eq!(err.status(), 502);
    }
}
