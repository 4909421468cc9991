//! # Repository Module
//!
//! Database repository implementations for Bulkbuy.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout handler                                                       │
//! │       │                                                                 │
//! │       │  db.products().get_active(id)                                  │
//! │       ▼                                                                 │
//! │  ProductRepository                     OrderRepository                 │
//! │  ├── list_active()                     ├── create(order, items)        │
//! │  ├── get_active(id)                    ├── get_detail(id)              │
//! │  ├── create(new_product)               └── update_status(id, status)   │
//! │  ├── soft_delete(id)                                                   │
//! │  └── count()                                                           │
//! │       │                                                                 │
//! │       │  SQL Query (row structs → domain types)                        │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are read into private `FromRow` structs and converted to domain
//! types here, so a malformed stored value surfaces as
//! [`DbError::CorruptRow`] instead of a panic further up.

pub mod order;
pub mod product;

use rust_decimal::Decimal;

use crate::error::{DbError, DbResult};

/// Parses a decimal TEXT column.
pub(crate) fn parse_decimal(table: &str, id: &str, column: &str, raw: &str) -> DbResult<Decimal> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|e| DbError::corrupt(table, id, format!("{column} {raw:?}: {e}")))
}

/// Generates a new entity ID.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(
            parse_decimal("products", "p", "base_price", "8.50").unwrap(),
            Decimal::new(850, 2)
        );
        let err = parse_decimal("products", "p", "base_price", "eight").unwrap_err();
        assert!(matches!(err, DbError::CorruptRow { .. }));
    }

    #[test]
    fn test_generate_id_is_uuid() {
        assert!(uuid::Uuid::parse_str(&generate_id()).is_ok());
    }
}
