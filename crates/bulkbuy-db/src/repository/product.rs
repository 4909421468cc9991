//! # Product Repository
//!
//! Database operations for products and their pricing tiers.
//!
//! ## Catalog Loading
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list_active()                                                          │
//! │                                                                         │
//! │  Query 1: active products              Query 2: their tiers            │
//! │  ┌───────────────────────┐             ┌─────────────────────────────┐ │
//! │  │ Premium Widget        │             │ widget │   1 │  10 │ 10.00  │ │
//! │  │ Standard Gadget       │             │ widget │  11 │  50 │  8.50  │ │
//! │  └───────────────────────┘             │ gadget │   1 │ NULL│  4.00  │ │
//! │              │                         └─────────────────────────────┘ │
//! │              └──────────── group by product_id ──────┘                 │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                Vec<CatalogProduct> (tiers ordered by min_quantity)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two queries regardless of catalog size; no per-product round trips.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{generate_id, parse_decimal};
use bulkbuy_core::pricing::validate_tier_set;
use bulkbuy_core::validation::{validate_price, validate_product_name, validate_stock_quantity};
use bulkbuy_core::{CatalogProduct, NewProduct, PricingTier, Product};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: Option<String>,
    base_price: String,
    image_url: Option<String>,
    stock_quantity: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self) -> DbResult<Product> {
        let base_price = parse_decimal("products", &self.id, "base_price", &self.base_price)?;

        Ok(Product {
            id: self.id,
            name: self.name,
            description: self.description,
            base_price,
            image_url: self.image_url,
            stock_quantity: self.stock_quantity,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct TierRow {
    id: i64,
    product_id: String,
    min_quantity: i64,
    max_quantity: Option<i64>,
    unit_price: String,
    discount_percentage: String,
}

impl TierRow {
    fn into_tier(self) -> DbResult<PricingTier> {
        let id = self.id.to_string();
        let unit_price = parse_decimal("pricing_tiers", &id, "unit_price", &self.unit_price)?;
        let discount = parse_decimal(
            "pricing_tiers",
            &id,
            "discount_percentage",
            &self.discount_percentage,
        )?;

        PricingTier::new(
            self.id,
            self.min_quantity,
            self.max_quantity.into(),
            unit_price,
            discount,
        )
        .map_err(|e| DbError::corrupt("pricing_tiers", id, e))
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let catalog = repo.list_active().await?;
/// let product = repo.get_active("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists active products with their tiers.
    ///
    /// Products come back in creation order; each product's tiers are
    /// ordered by `min_quantity`.
    pub async fn list_active(&self) -> DbResult<Vec<CatalogProduct>> {
        debug!("Listing active products");

        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT
                id, name, description, base_price, image_url,
                stock_quantity, is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1
            ORDER BY created_at, rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let tier_rows = sqlx::query_as::<_, TierRow>(
            r#"
            SELECT
                t.id, t.product_id, t.min_quantity, t.max_quantity,
                t.unit_price, t.discount_percentage
            FROM pricing_tiers t
            INNER JOIN products p ON p.id = t.product_id
            WHERE p.is_active = 1
            ORDER BY t.product_id, t.min_quantity
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut tiers_by_product: HashMap<String, Vec<PricingTier>> = HashMap::new();
        for row in tier_rows {
            let product_id = row.product_id.clone();
            tiers_by_product
                .entry(product_id)
                .or_default()
                .push(row.into_tier()?);
        }

        let catalog = rows
            .into_iter()
            .map(|row| {
                let tiers = tiers_by_product.remove(&row.id).unwrap_or_default();
                Ok(CatalogProduct {
                    product: row.into_product()?,
                    tiers,
                })
            })
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = catalog.len(), "Listed active products");
        Ok(catalog)
    }

    /// Gets an active product with its tiers.
    ///
    /// ## Returns
    /// * `Ok(Some(CatalogProduct))` - Product found and active
    /// * `Ok(None)` - Product missing or soft-deleted
    pub async fn get_active(&self, id: &str) -> DbResult<Option<CatalogProduct>> {
        debug!(id = %id, "Loading active product");

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT
                id, name, description, base_price, image_url,
                stock_quantity, is_active, created_at, updated_at
            FROM products
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tiers = self.load_tiers(id).await?;

        Ok(Some(CatalogProduct {
            product: row.into_product()?,
            tiers,
        }))
    }

    /// Loads a product's tiers ordered by `min_quantity`.
    async fn load_tiers(&self, product_id: &str) -> DbResult<Vec<PricingTier>> {
        sqlx::query_as::<_, TierRow>(
            r#"
            SELECT
                id, product_id, min_quantity, max_quantity,
                unit_price, discount_percentage
            FROM pricing_tiers
            WHERE product_id = ?1
            ORDER BY min_quantity
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(TierRow::into_tier)
        .collect()
    }

    /// Creates a product and its tiers in one transaction.
    ///
    /// ## Validation
    /// Name, base price, stock level and the complete tier set are checked
    /// before anything is written (see `validate_tier_set`).
    ///
    /// ## Returns
    /// The stored product with storage-assigned tier ids.
    pub async fn create(&self, new: &NewProduct) -> DbResult<CatalogProduct> {
        validate_product_name(&new.name)?;
        validate_price(new.base_price)?;
        validate_stock_quantity(new.stock_quantity)?;
        validate_tier_set(&new.tiers)?;

        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            name: new.name.trim().to_string(),
            description: new.description.clone(),
            base_price: new.base_price,
            image_url: new.image_url.clone(),
            stock_quantity: new.stock_quantity,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, tiers = new.tiers.len(), "Creating product");

        let mut sorted = new.tiers.clone();
        sorted.sort_by_key(|tier| tier.min_quantity());

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, base_price, image_url,
                stock_quantity, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.base_price.to_string())
        .bind(&product.image_url)
        .bind(product.stock_quantity)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        let mut tiers = Vec::with_capacity(sorted.len());
        for tier in sorted {
            let result = sqlx::query(
                r#"
                INSERT INTO pricing_tiers (
                    product_id, min_quantity, max_quantity, unit_price, discount_percentage
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&product.id)
            .bind(tier.min_quantity())
            .bind(tier.max_quantity().as_option())
            .bind(tier.unit_price().to_string())
            .bind(tier.discount_percentage().to_string())
            .execute(&mut *tx)
            .await?;

            tiers.push(tier.with_id(result.last_insert_rowid()));
        }

        tx.commit().await?;

        Ok(CatalogProduct { product, tiers })
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Existing orders still reference the product, so rows are never
    /// removed.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_active = 0, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics and seeding).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use bulkbuy_core::{TierBound, ValidationError};
    use rust_decimal::Decimal;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn tier(min: i64, max: Option<i64>, price: &str, discount: i64) -> PricingTier {
        PricingTier::new(0, min, max.into(), dec(price), Decimal::from(discount)).unwrap()
    }

    fn widget() -> NewProduct {
        NewProduct {
            name: "Premium Widget".to_string(),
            description: Some("High-quality widget".to_string()),
            base_price: dec("10.00"),
            image_url: None,
            stock_quantity: 1000,
            // Deliberately unsorted.
            tiers: vec![
                tier(51, Some(100), "7.00", 30),
                tier(1, Some(10), "10.00", 0),
                tier(101, None, "6.00", 40),
                tier(11, Some(50), "8.50", 15),
            ],
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_active() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.create(&widget()).await.unwrap();
        assert_eq!(created.product.name, "Premium Widget");
        assert!(created.tiers.iter().all(|t| t.id() > 0));

        let loaded = repo.get_active(&created.product.id).await.unwrap().unwrap();
        assert_eq!(loaded.product.base_price, dec("10.00"));
        assert_eq!(loaded.product.stock_quantity, 1000);

        let mins: Vec<_> = loaded.tiers.iter().map(|t| t.min_quantity()).collect();
        assert_eq!(mins, [1, 11, 51, 101]);
        assert_eq!(loaded.tiers[1].unit_price(), dec("8.50"));
        assert_eq!(loaded.tiers[3].max_quantity(), TierBound::Unbounded);
        assert_eq!(loaded.tiers, created.tiers);
    }

    #[tokio::test]
    async fn test_list_active_groups_tiers() {
        let db = test_db().await;
        let repo = db.products();

        let first = repo.create(&widget()).await.unwrap();
        let second = repo
            .create(&NewProduct {
                name: "Standard Gadget".to_string(),
                description: None,
                base_price: dec("4.00"),
                image_url: None,
                stock_quantity: 10,
                tiers: vec![tier(1, None, "4.00", 0)],
            })
            .await
            .unwrap();

        let catalog = repo.list_active().await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].product.id, first.product.id);
        assert_eq!(catalog[0].tiers.len(), 4);
        assert_eq!(catalog[1].product.id, second.product.id);
        assert_eq!(catalog[1].tiers.len(), 1);
    }

    #[tokio::test]
    async fn test_soft_deleted_product_is_hidden() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.create(&widget()).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);

        repo.soft_delete(&created.product.id).await.unwrap();

        assert!(repo.get_active(&created.product.id).await.unwrap().is_none());
        assert!(repo.list_active().await.unwrap().is_empty());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_soft_delete_missing_product() {
        let db = test_db().await;
        let err = db.products().soft_delete("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_unknown_product() {
        let db = test_db().await;
        assert!(db.products().get_active("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_tier_set() {
        let db = test_db().await;
        let repo = db.products();

        let mut gapped = widget();
        gapped.tiers = vec![tier(1, Some(10), "10.00", 0), tier(20, None, "8.00", 20)];

        let err = repo.create(&gapped).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Invalid(ValidationError::TierGap { from: 11, to: 19 })
        ));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let db = test_db().await;
        let mut blank = widget();
        blank.name = "   ".to_string();

        let err = db.products().create(&blank).await.unwrap_err();
        assert!(matches!(err, DbError::Invalid(ValidationError::Required { .. })));
    }

    #[tokio::test]
    async fn test_corrupt_decimal_is_reported() {
        let db = test_db().await;
        let created = db.products().create(&widget()).await.unwrap();

        sqlx::query("UPDATE pricing_tiers SET unit_price = 'cheap' WHERE product_id = ?1")
            .bind(&created.product.id)
            .execute(db.pool())
            .await
            .unwrap();

        let err = db
            .products()
            .get_active(&created.product.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CorruptRow { .. }));
    }
}
