//! Category model: named product groupings.
//!
//! A category has a unique machine `name` used as the filter key in listing
//! URLs, and an optional `friendly_name` for display. Products reference a
//! category through a nullable foreign key.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Unique machine name, used as filter and sort key.
    pub name: String,

    /// Human-readable display name.
    pub friendly_name: Option<String>,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub friendly_name: Option<String>,
}

impl Category {
    /// Display name, falling back to the machine name.
    pub fn display_name(&self) -> &str {
        self.friendly_name.as_deref().unwrap_or(&self.name)
    }

    /// Find a category by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let category = sqlx::query_as::<_, Self>(
            "SELECT id, name, friendly_name, created, changed FROM category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch category")?;

        Ok(category)
    }

    /// Find a category by its machine name.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>> {
        let category = sqlx::query_as::<_, Self>(
            "SELECT id, name, friendly_name, created, changed FROM category WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("failed to fetch category by name")?;

        Ok(category)
    }

    /// Resolve categories matching any of the given machine names.
    ///
    /// Used to echo active filter chips back to the listing template.
    pub async fn find_by_names(pool: &PgPool, names: &[String]) -> Result<Vec<Self>> {
        let categories = sqlx::query_as::<_, Self>(
            "SELECT id, name, friendly_name, created, changed FROM category WHERE name = ANY($1) ORDER BY name",
        )
        .bind(names)
        .fetch_all(pool)
        .await
        .context("failed to resolve categories by name")?;

        Ok(categories)
    }

    /// List all categories ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        let categories = sqlx::query_as::<_, Self>(
            "SELECT id, name, friendly_name, created, changed FROM category ORDER BY name",
        )
        .fetch_all(pool)
        .await
        .context("failed to list categories")?;

        Ok(categories)
    }

    /// Create a new category.
    pub async fn create(pool: &PgPool, input: CreateCategory) -> Result<Self> {
        let now = chrono::Utc::now().timestamp();
        let id = Uuid::now_v7();

        let category = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO category (id, name, friendly_name, created, changed)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, friendly_name, created, changed
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.friendly_name)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("failed to create category")?;

        Ok(category)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_friendly_name() {
        let category = Category {
            id: Uuid::nil(),
            name: "home_decor".to_string(),
            friendly_name: Some("Home Decor".to_string()),
            created: 1000,
            changed: 1000,
        };
        assert_eq!(category.display_name(), "Home Decor");
    }

    #[test]
    fn display_name_falls_back_to_machine_name() {
        let category = Category {
            id: Uuid::nil(),
            name: "toys".to_string(),
            friendly_name: None,
            created: 1000,
            changed: 1000,
        };
        assert_eq!(category.display_name(), "toys");
    }

    #[test]
    fn category_serialization() {
        let category = Category {
            id: Uuid::nil(),
            name: "food".to_string(),
            friendly_name: Some("Food".to_string()),
            created: 1000,
            changed: 1000,
        };

        let json = serde_json::to_string(&category).unwrap();
        assert!(json.contains("food"));

        let parsed: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name, "food");
    }
}
