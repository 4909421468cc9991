//! # Pricing Engine
//!
//! Volume-discount pricing: map a quantity to its tier, price one line item,
//! aggregate a cart, and project tiers for display.
//!
//! ## Tier Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Tiers (any input order)          quantity = 11                         │
//! │                                                                         │
//! │   sort by min_quantity (stable)                                         │
//! │   ┌──────────────┬──────────┬──────────┐                                │
//! │   │ 1 - 10       │ $10.00   │ base     │ ◄── base unit price            │
//! │   │ 11 - 50      │  $8.50   │ 15% off  │ ◄── first tier containing 11   │
//! │   │ 51 - 100     │  $7.00   │ 30% off  │                                │
//! │   │ 101+         │  $6.00   │ 40% off  │                                │
//! │   └──────────────┴──────────┴──────────┘                                │
//! │                                                                         │
//! │   subtotal = round2(11 × 8.50)          = $93.50                        │
//! │   savings  = round2(11 × (10.00 − 8.50)) = $16.50                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - Every function here is pure: same input, same output, no shared state.
//! - Only [`CoreError::InvalidInput`] and [`CoreError::NoApplicableTier`]
//!   are produced; a failing line item fails the whole cart.
//! - Unit prices are never rounded. Line amounts are computed exactly in
//!   decimal and rounded to the cent once.
//!
//! Tier sets are validated with [`validate_tier_set`] where they enter the
//! system (product creation). The resolution functions do not re-validate.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::ValidationResult;

// =============================================================================
// Tier Types
// =============================================================================

/// Upper bound of a tier's quantity range.
///
/// On the wire this is an optional integer: `null` means unbounded, which
/// matches the nullable `max_quantity` column in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<i64>", into = "Option<i64>")]
pub enum TierBound {
    /// Range ends at this quantity (inclusive).
    Bounded(i64),
    /// Range has no upper limit.
    Unbounded,
}

impl TierBound {
    /// Whether `quantity` is at or below this bound.
    #[inline]
    pub fn admits(&self, quantity: i64) -> bool {
        match self {
            TierBound::Bounded(max) => quantity <= *max,
            TierBound::Unbounded => true,
        }
    }

    /// The bound as a nullable integer (storage representation).
    #[inline]
    pub fn as_option(&self) -> Option<i64> {
        match self {
            TierBound::Bounded(max) => Some(*max),
            TierBound::Unbounded => None,
        }
    }
}

impl From<Option<i64>> for TierBound {
    fn from(max: Option<i64>) -> Self {
        match max {
            Some(max) => TierBound::Bounded(max),
            None => TierBound::Unbounded,
        }
    }
}

impl From<TierBound> for Option<i64> {
    fn from(bound: TierBound) -> Self {
        bound.as_option()
    }
}

/// A quantity range with its unit price.
///
/// Fields are private: the only way to obtain a tier is [`PricingTier::new`]
/// (deserialization goes through it too), so every tier in the system has a
/// non-negative price, non-negative bounds and `max >= min`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPricingTier", rename_all = "camelCase")]
pub struct PricingTier {
    id: i64,
    min_quantity: i64,
    max_quantity: TierBound,
    unit_price: Decimal,
    discount_percentage: Decimal,
}

/// Unvalidated wire shape of a tier.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPricingTier {
    #[serde(default)]
    id: i64,
    min_quantity: i64,
    #[serde(default)]
    max_quantity: Option<i64>,
    unit_price: Decimal,
    #[serde(default)]
    discount_percentage: Option<Decimal>,
}

impl TryFrom<RawPricingTier> for PricingTier {
    type Error = ValidationError;

    fn try_from(raw: RawPricingTier) -> Result<Self, Self::Error> {
        PricingTier::new(
            raw.id,
            raw.min_quantity,
            raw.max_quantity.into(),
            raw.unit_price,
            raw.discount_percentage.unwrap_or(Decimal::ZERO),
        )
    }
}

impl PricingTier {
    /// Creates a validated tier.
    ///
    /// ## Arguments
    /// * `id` - Storage-assigned id; `0` for tiers that are not persisted yet
    /// * `min_quantity` - Lowest quantity in the range (>= 0)
    /// * `max_quantity` - Highest quantity in the range, or unbounded
    /// * `unit_price` - Price per unit (>= 0, any precision)
    /// * `discount_percentage` - Display/audit only (>= 0)
    pub fn new(
        id: i64,
        min_quantity: i64,
        max_quantity: TierBound,
        unit_price: Decimal,
        discount_percentage: Decimal,
    ) -> ValidationResult<Self> {
        if min_quantity < 0 {
            return Err(ValidationError::Negative {
                field: "min_quantity".to_string(),
            });
        }

        if let TierBound::Bounded(max) = max_quantity {
            if max < min_quantity {
                return Err(ValidationError::InvertedTierRange {
                    min: min_quantity,
                    max,
                });
            }
        }

        if unit_price.is_sign_negative() && !unit_price.is_zero() {
            return Err(ValidationError::Negative {
                field: "unit_price".to_string(),
            });
        }

        if discount_percentage.is_sign_negative() && !discount_percentage.is_zero() {
            return Err(ValidationError::Negative {
                field: "discount_percentage".to_string(),
            });
        }

        Ok(PricingTier {
            id,
            min_quantity,
            max_quantity,
            unit_price,
            discount_percentage,
        })
    }

    /// Returns the same tier with a storage-assigned id.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    #[inline]
    pub fn id(&self) -> i64 {
        self.id
    }

    #[inline]
    pub fn min_quantity(&self) -> i64 {
        self.min_quantity
    }

    #[inline]
    pub fn max_quantity(&self) -> TierBound {
        self.max_quantity
    }

    #[inline]
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    #[inline]
    pub fn discount_percentage(&self) -> Decimal {
        self.discount_percentage
    }

    /// Whether `quantity` falls inside `[min_quantity, max_quantity]`.
    #[inline]
    pub fn contains(&self, quantity: i64) -> bool {
        quantity >= self.min_quantity && self.max_quantity.admits(quantity)
    }
}

/// Borrows the tiers sorted ascending by `min_quantity`.
///
/// Input order is never trusted; the caller's slice is left untouched.
fn sorted_by_min(tiers: &[PricingTier]) -> Vec<&PricingTier> {
    let mut sorted: Vec<&PricingTier> = tiers.iter().collect();
    sorted.sort_by_key(|tier| tier.min_quantity);
    sorted
}

// =============================================================================
// Tier-Set Validation
// =============================================================================

/// Validates a product's complete tier set.
///
/// ## Rules
/// - At least one tier
/// - Sorted by `min_quantity`, ranges are contiguous and do not overlap
/// - The last tier, and only the last, is unbounded
/// - Unit price never increases with quantity, so savings against the base
///   tier can never be negative
///
/// ## Example
/// ```rust
/// use bulkbuy_core::pricing::{validate_tier_set, PricingTier, TierBound};
/// use rust_decimal::Decimal;
///
/// let tiers = vec![
///     PricingTier::new(0, 1, TierBound::Bounded(10), Decimal::from(10), Decimal::ZERO).unwrap(),
///     PricingTier::new(0, 11, TierBound::Unbounded, Decimal::from(8), Decimal::from(20)).unwrap(),
/// ];
/// assert!(validate_tier_set(&tiers).is_ok());
/// ```
pub fn validate_tier_set(tiers: &[PricingTier]) -> ValidationResult<()> {
    let sorted = sorted_by_min(tiers);

    let last = match sorted.last() {
        Some(last) => *last,
        None => return Err(ValidationError::EmptyTierSet),
    };

    for pair in sorted.windows(2) {
        let (prev, next) = (pair[0], pair[1]);

        match prev.max_quantity {
            TierBound::Unbounded => {
                return Err(ValidationError::UnboundedTierNotLast {
                    min: prev.min_quantity,
                });
            }
            TierBound::Bounded(max) => {
                if next.min_quantity <= max {
                    return Err(ValidationError::TierOverlap {
                        first: prev.min_quantity,
                        second: next.min_quantity,
                    });
                }
                let expected = max.saturating_add(1);
                if next.min_quantity > expected {
                    return Err(ValidationError::TierGap {
                        from: expected,
                        to: next.min_quantity - 1,
                    });
                }
            }
        }

        if next.unit_price > prev.unit_price {
            return Err(ValidationError::TierPriceIncreases {
                min: next.min_quantity,
            });
        }
    }

    if let TierBound::Bounded(max) = last.max_quantity {
        return Err(ValidationError::MissingUnboundedTier { max });
    }

    Ok(())
}

// =============================================================================
// Line Item Pricing
// =============================================================================

/// Pricing of one quantity against one tier set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierPrice {
    pub quantity: i64,
    /// Unit price of the matched tier, unrounded.
    pub unit_price: Decimal,
    /// `quantity × unit_price`, rounded to the cent.
    pub subtotal: Money,
    /// `quantity × (base unit price − unit_price)`, rounded to the cent.
    pub savings: Money,
    pub discount_percentage: Decimal,
    pub tier_id: i64,
}

/// Resolves the tier for `quantity` and prices the line.
///
/// ## Algorithm
/// 1. Sort a copy of `tiers` by `min_quantity`
/// 2. Pick the first tier whose range contains `quantity`
/// 3. Compute subtotal and savings exactly, then round each to the cent
///
/// The savings baseline is the unit price of the lowest-`min_quantity`
/// tier, whichever tier is selected.
///
/// ## Errors
/// * [`CoreError::InvalidInput`] - `tiers` is empty, or the amounts do not
///   fit in cents
/// * [`CoreError::NoApplicableTier`] - no tier contains `quantity`
///
/// ## Example
/// ```rust
/// use bulkbuy_core::pricing::{compute_tier_price, PricingTier, TierBound};
/// use rust_decimal::Decimal;
///
/// let tiers = vec![
///     PricingTier::new(1, 1, TierBound::Bounded(10), Decimal::new(1000, 2), Decimal::ZERO).unwrap(),
///     PricingTier::new(2, 11, TierBound::Unbounded, Decimal::new(850, 2), Decimal::from(15)).unwrap(),
/// ];
///
/// let price = compute_tier_price(5, &tiers).unwrap();
/// assert_eq!(price.subtotal.cents(), 5000);
/// assert!(price.savings.is_zero());
/// ```
pub fn compute_tier_price(quantity: i64, tiers: &[PricingTier]) -> CoreResult<TierPrice> {
    let sorted = sorted_by_min(tiers);

    let base = sorted
        .first()
        .ok_or_else(|| CoreError::invalid_input("No pricing tiers available"))?;

    let tier = sorted
        .iter()
        .find(|tier| tier.contains(quantity))
        .ok_or(CoreError::NoApplicableTier { quantity })?;

    let qty = Decimal::from(quantity);
    let to_money = |amount: Option<Decimal>| {
        amount.and_then(Money::from_decimal).ok_or_else(|| {
            CoreError::invalid_input(format!(
                "amount for quantity {quantity} is out of range"
            ))
        })
    };

    let subtotal = to_money(qty.checked_mul(tier.unit_price))?;
    let savings = to_money(
        base.unit_price
            .checked_sub(tier.unit_price)
            .and_then(|per_unit| qty.checked_mul(per_unit)),
    )?;

    Ok(TierPrice {
        quantity,
        unit_price: tier.unit_price,
        subtotal,
        savings,
        discount_percentage: tier.discount_percentage,
        tier_id: tier.id,
    })
}

// =============================================================================
// Cart Aggregation
// =============================================================================

/// One product/quantity pair with the tiers that price it.
///
/// Built per request by the caller after resolving the product; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub tiers: Vec<PricingTier>,
}

/// A line item after tier resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLineItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Money,
    pub savings: Money,
    pub discount_percentage: Decimal,
    pub tier_id: i64,
}

impl PricedLineItem {
    fn new(request: &LineItemRequest, price: TierPrice) -> Self {
        PricedLineItem {
            product_id: request.product_id.clone(),
            product_name: request.product_name.clone(),
            quantity: price.quantity,
            unit_price: price.unit_price,
            subtotal: price.subtotal,
            savings: price.savings,
            discount_percentage: price.discount_percentage,
            tier_id: price.tier_id,
        }
    }
}

/// Aggregate pricing of a whole cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotal {
    /// Priced items, in request order.
    pub items: Vec<PricedLineItem>,
    /// Sum of the already-rounded item subtotals.
    pub total: Money,
    /// Sum of the already-rounded item savings.
    pub total_savings: Money,
    /// Number of line items (not units).
    pub item_count: usize,
}

/// Prices every line item and aggregates the cart.
///
/// ## Behavior
/// - Each item is priced independently against its own tiers
/// - The first failing item aborts the whole computation (no partial cart)
/// - Item order is preserved
/// - Totals sum the per-item amounts *after* each was rounded to the cent;
///   in integer cents the sum is exact, so no further rounding is needed
///
/// ## Example
/// ```rust
/// use bulkbuy_core::pricing::{compute_cart_total, LineItemRequest, PricingTier, TierBound};
/// use rust_decimal::Decimal;
///
/// let tiers = vec![
///     PricingTier::new(1, 1, TierBound::Unbounded, Decimal::new(250, 2), Decimal::ZERO).unwrap(),
/// ];
/// let items = vec![LineItemRequest {
///     product_id: "p-1".into(),
///     product_name: "Bolt".into(),
///     quantity: 4,
///     tiers,
/// }];
///
/// let cart = compute_cart_total(&items).unwrap();
/// assert_eq!(cart.total.cents(), 1000);
/// assert_eq!(cart.item_count, 1);
/// ```
pub fn compute_cart_total(items: &[LineItemRequest]) -> CoreResult<CartTotal> {
    let priced = items
        .iter()
        .map(|item| {
            compute_tier_price(item.quantity, &item.tiers)
                .map(|price| PricedLineItem::new(item, price))
        })
        .collect::<CoreResult<Vec<_>>>()?;

    let total = checked_sum(priced.iter().map(|item| item.subtotal))?;
    let total_savings = checked_sum(priced.iter().map(|item| item.savings))?;

    Ok(CartTotal {
        item_count: items.len(),
        items: priced,
        total,
        total_savings,
    })
}

fn checked_sum(mut amounts: impl Iterator<Item = Money>) -> CoreResult<Money> {
    amounts
        .try_fold(Money::zero(), Money::checked_add)
        .ok_or_else(|| CoreError::invalid_input("cart total is out of range"))
}

// =============================================================================
// Display Projection
// =============================================================================

/// Human-readable view of one tier, for tier tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierDisplay {
    /// `"11-50 units"` or `"101+ units"`.
    pub range: String,
    /// `"$8.50"`.
    pub price: String,
    /// `"15% off"` or `"Base price"`.
    pub discount: String,
    pub unit_price: Decimal,
}

/// Projects tiers for display, in the order given.
///
/// Makes no pricing decision; use [`compute_tier_price`] to price.
///
/// ## Example
/// ```rust
/// use bulkbuy_core::pricing::{format_tiers, PricingTier, TierBound};
/// use rust_decimal::Decimal;
///
/// let tiers = vec![
///     PricingTier::new(4, 101, TierBound::Unbounded, Decimal::from(6), Decimal::from(40)).unwrap(),
/// ];
/// let rows = format_tiers(&tiers);
/// assert_eq!(rows[0].range, "101+ units");
/// assert_eq!(rows[0].price, "$6.00");
/// assert_eq!(rows[0].discount, "40% off");
/// ```
pub fn format_tiers(tiers: &[PricingTier]) -> Vec<TierDisplay> {
    tiers
        .iter()
        .map(|tier| {
            let range = match tier.max_quantity {
                TierBound::Bounded(max) => format!("{}-{} units", tier.min_quantity, max),
                TierBound::Unbounded => format!("{}+ units", tier.min_quantity),
            };

            let rounded = tier
                .unit_price
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

            let discount = if tier.discount_percentage.is_zero() {
                "Base price".to_string()
            } else {
                format!("{}% off", tier.discount_percentage.normalize())
            };

            TierDisplay {
                range,
                price: format!("${:.2}", rounded),
                discount,
                unit_price: tier.unit_price,
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
