//! User identity surface.
//!
//! The catalog only reads identity: the session supplies a user id, and the
//! store supplies the `is_superuser` / `is_staff` flags that gate product
//! mutations. Account lifecycle is owned elsewhere.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub is_superuser: bool,
    pub is_staff: bool,
    pub created: i64,
}

impl User {
    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, Self>(
            "SELECT id, name, is_superuser, is_staff, created FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user by id")?;

        Ok(user)
    }
}
