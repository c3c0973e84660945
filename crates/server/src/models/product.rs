//! Product model and CRUD operations.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A catalog product.
///
/// Prices are stored as integer cents to avoid floating-point money.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Optional stock keeping unit.
    pub sku: Option<String>,

    /// Product name.
    pub name: String,

    /// Product description.
    pub description: String,

    /// Owning category, if any.
    pub category_id: Option<Uuid>,

    /// Price in cents.
    pub price_cents: i64,

    /// Average rating, if rated.
    pub rating: Option<f64>,

    /// External image URL, if any.
    pub image_url: Option<String>,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub sku: Option<String>,
    pub name: String,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub price_cents: i64,
    pub rating: Option<f64>,
    pub image_url: Option<String>,
}

/// Input for updating a product. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub sku: Option<Option<String>>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Option<Uuid>>,
    pub price_cents: Option<i64>,
    pub rating: Option<Option<f64>>,
    pub image_url: Option<Option<String>>,
}

const PRODUCT_COLUMNS: &str =
    "id, sku, name, description, category_id, price_cents, rating, image_url, created, changed";

impl Product {
    /// Find a product by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let product = sqlx::query_as::<_, Self>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch product")?;

        Ok(product)
    }

    /// Create a new product.
    pub async fn create(pool: &PgPool, input: CreateProduct) -> Result<Self> {
        let now = chrono::Utc::now().timestamp();
        let id = Uuid::now_v7();

        let product = sqlx::query_as::<_, Self>(&format!(
            r#"
            INSERT INTO product (id, sku, name, description, category_id, price_cents, rating, image_url, created, changed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.sku)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.category_id)
        .bind(input.price_cents)
        .bind(input.rating)
        .bind(&input.image_url)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("failed to create product")?;

        Ok(product)
    }

    /// Update a product. Returns `None` if it does not exist.
    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateProduct) -> Result<Option<Self>> {
        let Some(current) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let sku = input.sku.unwrap_or(current.sku);
        let name = input.name.unwrap_or(current.name);
        let description = input.description.unwrap_or(current.description);
        let category_id = input.category_id.unwrap_or(current.category_id);
        let price_cents = input.price_cents.unwrap_or(current.price_cents);
        let rating = input.rating.unwrap_or(current.rating);
        let image_url = input.image_url.unwrap_or(current.image_url);
        let now = chrono::Utc::now().timestamp();

        let product = sqlx::query_as::<_, Self>(&format!(
            r#"
            UPDATE product
            SET sku = $1, name = $2, description = $3, category_id = $4,
                price_cents = $5, rating = $6, image_url = $7, changed = $8
            WHERE id = $9
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&sku)
        .bind(&name)
        .bind(&description)
        .bind(category_id)
        .bind(price_cents)
        .bind(rating)
        .bind(&image_url)
        .bind(now)
        .bind(id)
        .fetch_one(pool)
        .await
        .context("failed to update product")?;

        Ok(Some(product))
    }

    /// Delete a product. Returns true if a row was removed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete product")?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all products.
    pub async fn count(pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product")
            .fetch_one(pool)
            .await
            .context("failed to count products")?;

        Ok(count)
    }

    /// Price formatted as a decimal string, e.g. `"24.99"`.
    pub fn price_display(&self) -> String {
        format!("{}.{:02}", self.price_cents / 100, self.price_cents % 100)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        Product {
            id: Uuid::nil(),
            sku: Some("pp5001340155".to_string()),
            name: "Deluxe Chess Set".to_string(),
            description: "A walnut and maple chess set.".to_string(),
            category_id: None,
            price_cents: 5499,
            rating: Some(4.5),
            image_url: None,
            created: 1000,
            changed: 1000,
        }
    }

    #[test]
    fn price_display_pads_cents() {
        let mut product = sample_product();
        product.price_cents = 5400;
        assert_eq!(product.price_display(), "54.00");

        product.price_cents = 5409;
        assert_eq!(product.price_display(), "54.09");

        product.price_cents = 99;
        assert_eq!(product.price_display(), "0.99");
    }

    #[test]
    fn product_serialization() {
        let product = sample_product();

        let json = serde_json::to_string(&product).unwrap();
        assert!(json.contains("Deluxe Chess Set"));

        let parsed: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.price_cents, 5499);
        assert_eq!(parsed.rating, Some(4.5));
    }

    #[test]
    fn update_input_defaults_to_no_changes() {
        let input = UpdateProduct::default();
        assert!(input.name.is_none());
        assert!(input.category_id.is_none());
    }
}
