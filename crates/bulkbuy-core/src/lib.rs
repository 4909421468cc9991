//! # bulkbuy-core: Pure Business Logic for Bulkbuy
//!
//! This crate is the **heart** of the Bulkbuy storefront. It contains the
//! volume-discount pricing engine and the types around it as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bulkbuy Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 storefront (handlers + CLI)                     │   │
//! │  │   list_catalog, price_cart, create_order, update_order_status   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ bulkbuy-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │  Tiers    │  │   rules   │  │   │
//! │  │   │  Order    │  │  rounding │  │  CartTotal│  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  bulkbuy-db (Database Layer)                    │   │
//! │  │            products, pricing_tiers, orders, order_items         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`pricing`] - Tier resolution, cart aggregation, tier display
//! - [`money`] - Money type with integer cents
//! - [`types`] - Persistent domain types (Product, Order, OrderItem)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use bulkbuy_core::pricing::{compute_tier_price, PricingTier, TierBound};
//! use rust_decimal::Decimal;
//!
//! let tiers = vec![
//!     PricingTier::new(1, 1, TierBound::Bounded(10), Decimal::new(1000, 2), Decimal::ZERO).unwrap(),
//!     PricingTier::new(2, 11, TierBound::Unbounded, Decimal::new(850, 2), Decimal::from(15)).unwrap(),
//! ];
//!
//! let price = compute_tier_price(11, &tiers).unwrap();
//! assert_eq!(price.subtotal.cents(), 9350);
//! assert_eq!(price.savings.cents(), 1650);
//! ```

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{
    compute_cart_total, compute_tier_price, format_tiers, CartTotal, LineItemRequest,
    PricedLineItem, PricingTier, TierBound, TierDisplay, TierPrice,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single cart or order.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// Bulk orders are the point of the store, so this is far above a retail
/// counter limit; it only guards against typos and overflow.
pub const MAX_ITEM_QUANTITY: i64 = 1_000_000;
