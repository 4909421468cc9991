//! # Domain Types
//!
//! Persistent entities used throughout Bulkbuy.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Order      │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  order_id (FK)  │       │
//! │  │  name           │   │  status         │   │  product_id     │       │
//! │  │  base_price     │   │  total_cents    │   │  unit_price     │       │
//! │  │  stock_quantity │   │  payment_intent │   │  subtotal_cents │       │
//! │  └────────┬────────┘   └─────────────────┘   └─────────────────┘       │
//! │           │ 1..n                                                        │
//! │  ┌────────▼────────┐   ┌─────────────────┐                              │
//! │  │  PricingTier    │   │  OrderStatus    │                              │
//! │  │  (pricing.rs)   │   │  pending → paid │                              │
//! │  └─────────────────┘   │  → shipped → …  │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage owns these records. The pricing engine never sees them directly:
//! handlers turn a [`CatalogProduct`] into a [`LineItemRequest`] first.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::pricing::{LineItemRequest, PricingTier};

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in the catalog and on orders.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// List price. Informational only: orders are priced from the tiers.
    pub base_price: Decimal,

    /// Optional image for catalog display.
    pub image_url: Option<String>,

    /// Units on hand.
    pub stock_quantity: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks if `quantity` units can be sold right now.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_active && self.stock_quantity >= quantity
    }
}

/// A product together with its pricing tiers, ordered by `min_quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    #[serde(flatten)]
    pub product: Product,
    pub tiers: Vec<PricingTier>,
}

impl CatalogProduct {
    /// Builds the pricing input for `quantity` units of this product.
    pub fn to_line_item(&self, quantity: i64) -> LineItemRequest {
        LineItemRequest {
            product_id: self.product.id.clone(),
            product_name: self.product.name.clone(),
            quantity,
            tiers: self.tiers.clone(),
        }
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub base_price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock_quantity: i64,
    pub tiers: Vec<PricingTier>,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of an order.
///
/// Orders are created `Pending` (payment intent issued but not confirmed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// The storage/wire name of this status.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL
                    .iter()
                    .map(|status| status.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// `None` for guest checkouts.
    pub user_id: Option<String>,
    pub total_cents: i64,
    pub status: OrderStatus,
    /// Payment processor reference.
    pub payment_intent_id: Option<String>,
    /// Opaque JSON supplied by the customer.
    pub shipping_address: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line of an order.
/// Uses snapshot pattern to freeze the tier price at time of order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Current product name (joined on read).
    pub product_name: String,
    pub quantity: i64,
    /// Tier unit price at time of order (frozen, unrounded).
    pub unit_price: Decimal,
    /// Rounded line subtotal at time of order (frozen).
    pub subtotal_cents: i64,
}

/// An order with its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::TierBound;

    fn product(stock: i64, active: bool) -> Product {
        Product {
            id: "p-1".to_string(),
            name: "Premium Widget".to_string(),
            description: None,
            base_price: Decimal::new(1000, 2),
            image_url: None,
            stock_quantity: stock,
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_can_sell() {
        assert!(product(10, true).can_sell(10));
        assert!(!product(10, true).can_sell(11));
        assert!(!product(10, false).can_sell(1));
    }

    #[test]
    fn test_to_line_item() {
        let tier = PricingTier::new(1, 1, TierBound::Unbounded, Decimal::ONE, Decimal::ZERO)
            .unwrap();
        let catalog = CatalogProduct {
            product: product(5, true),
            tiers: vec![tier.clone()],
        };

        let item = catalog.to_line_item(3);
        assert_eq!(item.product_id, "p-1");
        assert_eq!(item.product_name, "Premium Widget");
        assert_eq!(item.quantity, 3);
        assert_eq!(item.tiers, vec![tier]);
    }

    #[test]
    fn test_order_status_parsing() {
        assert_eq!("paid".parse::<OrderStatus>().unwrap(), OrderStatus::Paid);
        assert_eq!(" Shipped ".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("refunded".parse::<OrderStatus>().is_err());

        for status in OrderStatus::ALL {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_order_status_serialization() {
        let json = serde_json::to_string(&OrderStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }
}
