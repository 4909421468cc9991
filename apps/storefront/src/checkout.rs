//! # Checkout Handlers
//!
//! Request handlers for the catalog, cart pricing, and orders.
//!
//! ## Cart Pricing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartRequest { items: [{ productId, quantity }, ...] }                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate cart size + each quantity                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  for each line: db.products().get_active(id)                           │
//! │       ├── missing / inactive ──► NOT_FOUND                             │
//! │       ├── Σ quantity > stock ─► INSUFFICIENT_STOCK                     │
//! │       └── CatalogProduct::to_line_item(quantity)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  compute_cart_total(lines) ── engine errors pass through unchanged     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CartTotal { items, total, totalSavings, itemCount }                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Order creation runs the same flow, then opens a payment intent for the
//! total and stores a `pending` order with the priced lines.
//!
//! A product listed on several lines is checked against stock with the sum
//! of those lines' quantities.

use std::collections::{BTreeMap, HashMap};

use bulkbuy_core::validation::{validate_cart_size, validate_quantity};
use bulkbuy_core::{
    compute_cart_total, format_tiers, CartTotal, CatalogProduct, CoreError, LineItemRequest,
    Money, NewProduct, Order, OrderDetail, OrderStatus, PricingTier, Product, TierDisplay,
};
use bulkbuy_db::repository::order::NewOrder;
use bulkbuy_db::Database;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::payment::{PaymentGateway, PaymentIntentRequest};

// =============================================================================
// Request / Response Types
// =============================================================================

/// One requested product and quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Cart pricing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartRequest {
    pub items: Vec<CartLine>,
}

/// Order creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Omitted for guest checkout.
    #[serde(default)]
    pub user_id: Option<String>,
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub shipping_address: Option<serde_json::Value>,
}

/// Result of a successful order creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub id: String,
    pub total: Money,
    pub status: OrderStatus,
    /// Payment intent secret for the client to confirm payment.
    pub client_secret: String,
}

/// A catalog product with its display-ready tier table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub product: Product,
    pub tiers: Vec<PricingTier>,
    pub tier_table: Vec<TierDisplay>,
}

impl From<CatalogProduct> for CatalogEntry {
    fn from(catalog: CatalogProduct) -> Self {
        CatalogEntry {
            tier_table: format_tiers(&catalog.tiers),
            product: catalog.product,
            tiers: catalog.tiers,
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Lists active products with their tiers.
pub async fn list_catalog(db: &Database) -> Result<Vec<CatalogEntry>, ApiError> {
    debug!("list_catalog");

    let catalog = db.products().list_active().await?;
    Ok(catalog.into_iter().map(CatalogEntry::from).collect())
}

/// Creates a product and its tier table.
pub async fn create_product(db: &Database, product: NewProduct) -> Result<CatalogProduct, ApiError> {
    debug!(name = %product.name, "create_product");

    let created = db.products().create(&product).await.map_err(|e| {
        warn!(error = %e, "Product rejected");
        ApiError::from(e)
    })?;

    info!(id = %created.product.id, tiers = created.tiers.len(), "Product created");
    Ok(created)
}

// =============================================================================
// Cart
// =============================================================================

/// Resolves each requested line to an active product and checks stock.
async fn resolve_lines(db: &Database, lines: &[CartLine]) -> Result<Vec<LineItemRequest>, ApiError> {
    validate_cart_size(lines.len())?;

    let mut requested: HashMap<&str, i64> = HashMap::with_capacity(lines.len());
    for line in lines {
        validate_quantity(line.quantity)?;
        *requested.entry(line.product_id.as_str()).or_default() += line.quantity;
    }

    let products = db.products();
    let mut resolved = Vec::with_capacity(lines.len());

    for line in lines {
        let wanted = requested
            .get(line.product_id.as_str())
            .copied()
            .unwrap_or(line.quantity);

        let catalog = products
            .get_active(&line.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

        if !catalog.product.can_sell(wanted) {
            return Err(CoreError::InsufficientStock {
                product: catalog.product.name.clone(),
                available: catalog.product.stock_quantity,
                requested: wanted,
            }
            .into());
        }

        resolved.push(catalog.to_line_item(line.quantity));
    }

    Ok(resolved)
}

/// Resolves and prices a cart.
async fn price_lines(db: &Database, lines: &[CartLine]) -> Result<CartTotal, ApiError> {
    let resolved = resolve_lines(db, lines).await?;
    Ok(compute_cart_total(&resolved)?)
}

/// Prices a cart without placing an order.
///
/// ## Errors
/// * `VALIDATION_ERROR` - Empty/oversized cart or bad quantity
/// * `NOT_FOUND` - Unknown or inactive product
/// * `INSUFFICIENT_STOCK` - Quantity above stock
/// * `INVALID_INPUT` / `NO_APPLICABLE_TIER` - From the pricing engine
pub async fn price_cart(db: &Database, request: &CartRequest) -> Result<CartTotal, ApiError> {
    debug!(lines = request.items.len(), "price_cart");

    price_lines(db, &request.items).await.map_err(|e| {
        warn!(code = ?e.code, message = %e.message, "Cart rejected");
        e
    })
}

// =============================================================================
// Orders
// =============================================================================

/// Prices the cart, opens a payment intent, and stores a `pending` order.
///
/// ## Flow
/// 1. Same resolution and pricing as [`price_cart`]
/// 2. Payment intent for `total` in minor units, with `userId` (or
///    `"guest"`) and `itemCount` metadata
/// 3. Order and items stored in one transaction
///
/// Nothing is stored if the gateway refuses the intent. If the order insert
/// fails after the intent was opened, the intent id is logged so it can be
/// cancelled with the processor.
pub async fn create_order(
    db: &Database,
    gateway: &dyn PaymentGateway,
    request: &CheckoutRequest,
    currency: &str,
) -> Result<OrderConfirmation, ApiError> {
    debug!(lines = request.items.len(), "create_order");

    let cart = price_lines(db, &request.items).await.map_err(|e| {
        warn!(code = ?e.code, message = %e.message, "Checkout rejected");
        e
    })?;

    let metadata = BTreeMap::from([
        (
            "userId".to_string(),
            request
                .user_id
                .clone()
                .unwrap_or_else(|| "guest".to_string()),
        ),
        ("itemCount".to_string(), cart.item_count.to_string()),
    ]);

    let intent = gateway
        .create_payment_intent(PaymentIntentRequest {
            amount_minor: cart.total.cents(),
            currency: currency.to_ascii_lowercase(),
            metadata,
        })
        .await?;

    let stored = db
        .orders()
        .create(
            &NewOrder {
                user_id: request.user_id.clone(),
                total: cart.total,
                payment_intent_id: Some(intent.id.clone()),
                shipping_address: request.shipping_address.clone(),
            },
            &cart.items,
        )
        .await
        .map_err(|e| {
            warn!(
                payment_intent = %intent.id,
                error = %e,
                "Order not stored; payment intent left without an order"
            );
            ApiError::from(e)
        })?;

    info!(
        order_id = %stored.order.id,
        total = %cart.total,
        items = cart.item_count,
        payment_intent = %intent.id,
        "Order created"
    );

    Ok(OrderConfirmation {
        id: stored.order.id,
        total: cart.total,
        status: stored.order.status,
        client_secret: intent.client_secret,
    })
}

/// Gets an order with its items.
pub async fn get_order(db: &Database, id: &str) -> Result<OrderDetail, ApiError> {
    debug!(id = %id, "get_order");

    db.orders()
        .get_detail(id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(id.to_string()).into())
}

/// Sets an order's status.
pub async fn update_order_status(
    db: &Database,
    id: &str,
    status: OrderStatus,
) -> Result<Order, ApiError> {
    let order = db.orders().update_status(id, status).await?;
    info!(id = %id, status = %status, "Order status updated");
    Ok(order)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::payment::SimulatedGateway;
    use bulkbuy_core::TierBound;
    use bulkbuy_db::DbConfig;
    use rust_decimal::Decimal;

    fn tier(min: i64, max: Option<i64>, cents: i64, discount: i64) -> PricingTier {
        PricingTier::new(
            0,
            min,
            TierBound::from(max),
            Decimal::new(cents, 2),
            Decimal::from(discount),
        )
        .unwrap()
    }

    fn volume_product(name: &str, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: None,
            base_price: Decimal::new(1000, 2),
            image_url: None,
            stock_quantity: stock,
            tiers: vec![
                tier(1, Some(10), 1000, 0),
                tier(11, Some(50), 850, 15),
                tier(51, Some(100), 700, 30),
                tier(101, None, 600, 40),
            ],
        }
    }

    async fn shop() -> (Database, String, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = create_product(&db, volume_product("Premium Widget", 1000))
            .await
            .unwrap();
        let b = create_product(&db, volume_product("Standard Gadget", 80))
            .await
            .unwrap();
        (db, a.product.id, b.product.id)
    }

    fn line(product_id: &str, quantity: i64) -> CartLine {
        CartLine {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_list_catalog() {
        let (db, a, _) = shop().await;

        let catalog = list_catalog(&db).await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].product.id, a);
        assert_eq!(catalog[0].tier_table[0].range, "1-10 units");
        assert_eq!(catalog[0].tier_table[1].discount, "15% off");
        assert_eq!(catalog[0].tier_table[3].range, "101+ units");
    }

    #[tokio::test]
    async fn test_catalog_entry_keys_are_camel_case() {
        let (db, _, _) = shop().await;

        let catalog = list_catalog(&db).await.unwrap();
        let json = serde_json::to_value(&catalog[0]).unwrap();
        let entry = json.as_object().unwrap();

        for key in ["basePrice", "stockQuantity", "isActive", "createdAt", "tierTable"] {
            assert!(entry.contains_key(key), "missing {key}");
        }
        assert!(entry.keys().all(|k| !k.contains('_')), "{:?}", entry.keys());

        let tier = json["tiers"][3].as_object().unwrap();
        assert_eq!(tier["minQuantity"], 101);
        assert!(tier["maxQuantity"].is_null());
        assert_eq!(tier["unitPrice"], "6.00");
        assert!(tier.keys().all(|k| !k.contains('_')), "{:?}", tier.keys());
    }

    #[tokio::test]
    async fn test_price_cart() {
        let (db, a, b) = shop().await;

        let cart = price_cart(
            &db,
            &CartRequest {
                items: vec![line(&a, 25), line(&b, 60)],
            },
        )
        .await
        .unwrap();

        assert_eq!(cart.total, Money::from_cents(63250));
        assert_eq!(cart.total_savings, Money::from_cents(21750));
        assert_eq!(cart.item_count, 2);
        assert_eq!(cart.items[0].product_name, "Premium Widget");
        assert_eq!(cart.items[1].product_name, "Standard Gadget");
    }

    #[tokio::test]
    async fn test_price_cart_rejections() {
        let (db, a, b) = shop().await;

        let empty = price_cart(&db, &CartRequest { items: vec![] }).await.unwrap_err();
        assert_eq!(empty.code, ErrorCode::ValidationError);

        let zero = price_cart(&db, &CartRequest { items: vec![line(&a, 0)] })
            .await
            .unwrap_err();
        assert_eq!(zero.code, ErrorCode::ValidationError);

        let unknown = price_cart(&db, &CartRequest { items: vec![line("nope", 1)] })
            .await
            .unwrap_err();
        assert_eq!(unknown.code, ErrorCode::NotFound);
        assert_eq!(unknown.message, "Product not found: nope");

        let stock = price_cart(&db, &CartRequest { items: vec![line(&b, 81)] })
            .await
            .unwrap_err();
        assert_eq!(stock.code, ErrorCode::InsufficientStock);
        assert!(stock.message.contains("Standard Gadget"));
        assert!(stock.message.contains("Available: 80"));
    }

    #[tokio::test]
    async fn test_stock_check_sums_repeated_lines() {
        let (db, a, b) = shop().await;

        let err = price_cart(
            &db,
            &CartRequest {
                items: vec![line(&b, 50), line(&a, 1), line(&b, 50)],
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("Available: 80"));
        assert!(err.message.contains("requested: 100"));

        let cart = price_cart(
            &db,
            &CartRequest {
                items: vec![line(&b, 40), line(&b, 40)],
            },
        )
        .await
        .unwrap();
        assert_eq!(cart.item_count, 2);
    }

    #[tokio::test]
    async fn test_inactive_product_is_not_found() {
        let (db, a, _) = shop().await;
        db.products().soft_delete(&a).await.unwrap();

        let err = price_cart(&db, &CartRequest { items: vec![line(&a, 1)] })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_engine_error_passes_through() {
        let (db, a, _) = shop().await;

        sqlx::query("DELETE FROM pricing_tiers WHERE product_id = ?1 AND min_quantity = 11")
            .bind(&a)
            .execute(db.pool())
            .await
            .unwrap();

        let err = price_cart(&db, &CartRequest { items: vec![line(&a, 25)] })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NoApplicableTier);
        assert_eq!(
            err.message,
            "No applicable pricing tier found for quantity: 25"
        );
    }

    #[tokio::test]
    async fn test_create_order() {
        let (db, a, b) = shop().await;
        let gateway = SimulatedGateway::new();

        let confirmation = create_order(
            &db,
            &gateway,
            &CheckoutRequest {
                user_id: None,
                items: vec![line(&a, 25), line(&b, 60)],
                shipping_address: Some(serde_json::json!({"line1": "1 Mall Road"})),
            },
            "USD",
        )
        .await
        .unwrap();

        assert_eq!(confirmation.total, Money::from_cents(63250));
        assert_eq!(confirmation.status, OrderStatus::Pending);
        assert!(!confirmation.client_secret.is_empty());

        let accepted = gateway.accepted().await;
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].amount_minor, 63250);
        assert_eq!(accepted[0].currency, "usd");
        assert_eq!(accepted[0].metadata["userId"], "guest");
        assert_eq!(accepted[0].metadata["itemCount"], "2");

        let detail = get_order(&db, &confirmation.id).await.unwrap();
        assert_eq!(detail.order.total_cents, 63250);
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.items[0].subtotal_cents, 21250);
        assert_eq!(detail.items[1].unit_price, Decimal::new(700, 2));
        assert!(detail.order.payment_intent_id.is_some());
    }

    #[tokio::test]
    async fn test_declined_payment_stores_nothing() {
        let (db, a, _) = shop().await;
        let gateway = SimulatedGateway::declining("card declined");

        let err = create_order(
            &db,
            &gateway,
            &CheckoutRequest {
                user_id: Some("user-7".to_string()),
                items: vec![line(&a, 5)],
                shipping_address: None,
            },
            "usd",
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);

        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orders, 0);
    }

    #[tokio::test]
    async fn test_failed_order_insert_keeps_nothing() {
        let (db, a, _) = shop().await;
        let gateway = SimulatedGateway::new();

        sqlx::query("DROP TABLE order_items")
            .execute(db.pool())
            .await
            .unwrap();

        let err = create_order(
            &db,
            &gateway,
            &CheckoutRequest {
                user_id: None,
                items: vec![line(&a, 5)],
                shipping_address: None,
            },
            "usd",
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);

        // The intent was opened before the insert failed.
        assert_eq!(gateway.accepted().await.len(), 1);

        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orders, 0);
    }

    #[tokio::test]
    async fn test_order_status_lifecycle() {
        let (db, a, _) = shop().await;
        let gateway = SimulatedGateway::new();

        let confirmation = create_order(
            &db,
            &gateway,
            &CheckoutRequest {
                user_id: Some("user-1".to_string()),
                items: vec![line(&a, 3)],
                shipping_address: None,
            },
            "usd",
        )
        .await
        .unwrap();
        assert_eq!(gateway.accepted().await[0].metadata["userId"], "user-1");

        let order = update_order_status(&db, &confirmation.id, OrderStatus::Paid)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.total(), Money::from_cents(3000));
    }

    #[tokio::test]
    async fn test_missing_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = get_order(&db, "missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Order not found: missing");

        let err = update_order_status(&db, "missing", OrderStatus::Shipped)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
