//! # Domain Errors
//!
//! ```text
//! compute_tier_price / compute_cart_total
//!     └── CoreError::InvalidInput       no tiers, or amount not representable
//!     └── CoreError::NoApplicableTier   quantity outside every tier
//!
//! checkout handlers (before pricing)
//!     └── ProductNotFound / OrderNotFound / InsufficientStock
//!     └── Validation(ValidationError)   bad request fields, bad tier sets
//! ```
//!
//! Engine errors pass through the storefront unchanged; each keeps its own
//! error code in the API response.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The tier set for a line item is missing or empty, or the arithmetic
    /// on it cannot be represented.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The quantity falls outside every tier range.
    ///
    /// ## When This Occurs
    /// - A gap in the tier coverage (data-integrity problem)
    /// - Quantity below the lowest tier's minimum (e.g. 0)
    #[error("No applicable pricing tier found for quantity: {quantity}")]
    NoApplicableTier { quantity: i64 },

    /// Product cannot be found (or is inactive).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Insufficient stock to cover the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Price cart (qty: 500)
    ///      │
    ///      ▼
    /// Check stock: available=300
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Premium Widget", available: 300, requested: 500 }
    /// ```
    #[error("Insufficient stock for {product}. Available: {available}, requested: {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        CoreError::InvalidInput(reason.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet requirements. Tier variants
/// are raised where tiers enter the system, never by the pricing engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// A tier's upper bound is below its lower bound.
    #[error("tier starting at {min} has max_quantity {max} below its min_quantity")]
    InvertedTierRange { min: i64, max: i64 },

    /// A product must have at least one tier.
    #[error("pricing tiers are required")]
    EmptyTierSet,

    /// Two tiers claim the same quantity.
    #[error("tiers starting at {first} and {second} overlap")]
    TierOverlap { first: i64, second: i64 },

    /// Quantities between two tiers are not covered.
    #[error("no tier covers quantities {from} to {to}")]
    TierGap { from: i64, to: i64 },

    /// An unbounded tier is followed by another tier.
    #[error("unbounded tier starting at {min} must be the last tier")]
    UnboundedTierNotLast { min: i64 },

    /// The top tier has an upper bound, leaving larger quantities unpriced.
    #[error("the last tier must be unbounded (ends at {max})")]
    MissingUnboundedTier { max: i64 },

    /// A higher-quantity tier is more expensive than a lower one.
    #[error("tier starting at {min} has a higher unit price than the tier before it")]
    TierPriceIncreases { min: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Premium Widget".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Premium Widget. Available: 3, requested: 5"
        );

        let err = CoreError::NoApplicableTier { quantity: 0 };
        assert_eq!(
            err.to_string(),
            "No applicable pricing tier found for quantity: 0"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::TierGap { from: 11, to: 19 };
        assert_eq!(err.to_string(), "no tier covers quantities 11 to 19");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::EmptyTierSet.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
