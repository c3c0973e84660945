//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::catalog::CatalogService;
use crate::config::Config;
use crate::db;
use crate::theme::ThemeEngine;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// Theme engine for template rendering.
    theme: ThemeEngine,

    /// Catalog query service.
    catalog: CatalogService,
}

impl AppState {
    /// Create new application state with database connections.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&db)
            .await
            .context("failed to run migrations")?;

        let theme = match ThemeEngine::new(&config.templates_dir) {
            Ok(theme) => theme,
            Err(e) => {
                tracing::warn!(error = ?e, "failed to load templates, using empty engine");
                ThemeEngine::empty()
            }
        };

        let catalog = CatalogService::new(db.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner { db, theme, catalog }),
        })
    }

    /// Build state from existing parts (for tests).
    pub fn from_parts(db: PgPool, theme: ThemeEngine) -> Self {
        let catalog = CatalogService::new(db.clone());
        Self {
            inner: Arc::new(AppStateInner { db, theme, catalog }),
        }
    }

    /// Get the database pool.
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// Get the theme engine.
    pub fn theme(&self) -> &ThemeEngine {
        &self.inner.theme
    }

    /// Get the catalog service.
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Check if PostgreSQL is healthy.
    pub async fn postgres_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }
}
