//! # Input Validation
//!
//! Field-level checks run where data enters the system. The pricing engine
//! itself never calls these; it reports its own `InvalidInput` and
//! `NoApplicableTier` errors.
//!
//! ```text
//! checkout handler ── validate_cart_size, validate_quantity
//! product create   ── validate_product_name, validate_price,
//!                     validate_stock_quantity, validate_tier_set (pricing.rs)
//! SQLite           ── CHECK / NOT NULL / FOREIGN KEY as the last line
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted product name, in characters.
pub const MAX_PRODUCT_NAME_CHARS: usize = 200;

/// Non-blank, at most [`MAX_PRODUCT_NAME_CHARS`] after trimming.
///
/// ```rust
/// use bulkbuy_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Premium Widget").is_ok());
/// assert!(validate_product_name("  ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "name".into(),
        });
    }
    if trimmed.chars().count() > MAX_PRODUCT_NAME_CHARS {
        return Err(ValidationError::TooLong {
            field: "name".into(),
            max: MAX_PRODUCT_NAME_CHARS,
        });
    }
    Ok(())
}

/// A cart line asks for `1..=MAX_ITEM_QUANTITY` units.
///
/// Zero is rejected here with a validation error; the pricing engine on its
/// own would answer `NoApplicableTier` for it.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    match quantity {
        q if q <= 0 => Err(ValidationError::MustBePositive {
            field: "quantity".into(),
        }),
        q if q > MAX_ITEM_QUANTITY => Err(ValidationError::OutOfRange {
            field: "quantity".into(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        }),
        _ => Ok(()),
    }
}

/// Base prices may be zero but not negative.
pub fn validate_price(price: Decimal) -> ValidationResult<()> {
    non_negative("base_price", price < Decimal::ZERO)
}

pub fn validate_stock_quantity(stock: i64) -> ValidationResult<()> {
    non_negative("stock_quantity", stock < 0)
}

/// A cart has between 1 and [`MAX_CART_ITEMS`] lines.
pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "items".into(),
        });
    }
    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".into(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }
    Ok(())
}

fn non_negative(field: &str, is_negative: bool) -> ValidationResult<()> {
    if is_negative {
        Err(ValidationError::Negative {
            field: field.into(),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_name() {
        assert!(validate_product_name("Eco Shipping Box").is_ok());
        assert!(validate_product_name(&"é".repeat(MAX_PRODUCT_NAME_CHARS)).is_ok());

        assert_eq!(
            validate_product_name(""),
            Err(ValidationError::Required {
                field: "name".into()
            })
        );
        assert!(matches!(
            validate_product_name(&"x".repeat(MAX_PRODUCT_NAME_CHARS + 1)),
            Err(ValidationError::TooLong { max: 200, .. })
        ));
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());

        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_quantity(-3),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_quantity(MAX_ITEM_QUANTITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_non_negative_fields() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::new(125, 3)).is_ok());
        assert_eq!(
            validate_price(Decimal::new(-1, 2)),
            Err(ValidationError::Negative {
                field: "base_price".into()
            })
        );

        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(-1).is_err());
    }

    #[test]
    fn test_cart_size() {
        assert!(validate_cart_size(1).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_ok());
        assert_eq!(
            validate_cart_size(0),
            Err(ValidationError::Required {
                field: "items".into()
            })
        );
        assert!(validate_cart_size(MAX_CART_ITEMS + 1).is_err());
    }
}
