//! # bulkbuy-storefront
//!
//! Checkout handlers, payment gateway seam, and configuration for the
//! Bulkbuy storefront. The `storefront` binary drives these handlers from
//! the command line.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  storefront CLI / transport                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  checkout::{list_catalog, price_cart, create_order, get_order, ...}    │
//! │       │                      │                       │                  │
//! │       ▼                      ▼                       ▼                  │
//! │  bulkbuy-db            bulkbuy-core            PaymentGateway          │
//! │  (catalog, orders)     (tier pricing)          (payment intents)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Result<T, ApiError> ──► { "code": "...", "message": "..." }           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod checkout;
pub mod config;
pub mod error;
pub mod payment;

pub use checkout::{
    CartLine, CartRequest, CatalogEntry, CheckoutRequest, OrderConfirmation,
};
pub use config::{ConfigError, PaymentProvider, StorefrontConfig};
pub use error::{ApiError, ErrorCode};
pub use payment::{PaymentError, PaymentGateway, PaymentIntent, PaymentIntentRequest, SimulatedGateway};
