//! Catalog execution service.
//!
//! Runs compiled catalog queries against PostgreSQL and resolves the active
//! category filters for display. Stateless per request; the pool handles its
//! own concurrency.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;

use crate::models::{Category, Product};

use super::types::{CatalogParams, Selection, interpret_params};

/// Pager metadata for the listing template.
#[derive(Debug, Clone, Serialize)]
pub struct Pager {
    /// Total matches before paging.
    pub total: u64,

    /// Current page number (1-indexed).
    pub page: u32,

    /// Items per page.
    pub per_page: u32,

    /// Total number of pages.
    pub total_pages: u32,

    /// Whether there's a next page.
    pub has_next: bool,

    /// Whether there's a previous page.
    pub has_prev: bool,
}

impl Pager {
    /// Create pager metadata with paging calculations.
    pub fn new(total: u64, page: u32, per_page: u32) -> Self {
        let total_pages = if per_page > 0 {
            ((total as f64) / (f64::from(per_page))).ceil() as u32
        } else {
            1
        };

        Self {
            total,
            page,
            per_page,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// A listing page ready for the presentation layer.
#[derive(Debug)]
pub struct CatalogPage {
    /// Filtered, ordered products for the current page.
    pub products: Vec<Product>,

    /// The search term as entered, if any.
    pub search_term: Option<String>,

    /// Resolved active category filters.
    pub current_categories: Vec<Category>,

    /// Composite sort label for UI state.
    pub current_sorting: String,

    /// Pager metadata.
    pub pager: Pager,
}

/// Outcome of running the catalog pipeline for one request.
#[derive(Debug)]
pub enum CatalogOutcome {
    /// Render the listing.
    Listing(CatalogPage),
    /// Flash the message and redirect.
    Redirect { message: String, to: String },
}

/// Executes catalog selections against the store.
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

impl CatalogService {
    /// Create a new catalog service.
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Interpret the listing parameters and run the resulting selection.
    pub async fn run(&self, params: &CatalogParams) -> Result<CatalogOutcome> {
        let selection = match interpret_params(params) {
            Selection::Abort(abort) => {
                tracing::debug!(message = %abort.message, "catalog selection aborted");
                return Ok(CatalogOutcome::Redirect {
                    message: abort.message,
                    to: abort.redirect_to,
                });
            }
            Selection::Proceed(selection) => selection,
        };

        let sql = selection.query.compile();
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.db)
            .await
            .context("failed to run catalog query")?;

        let count_sql = selection.query.compile_count();
        let total: i64 = sqlx::query_scalar(&count_sql)
            .fetch_one(&self.db)
            .await
            .context("failed to count catalog query")?;

        let current_categories = if selection.category_names.is_empty() {
            Vec::new()
        } else {
            Category::find_by_names(&self.db, &selection.category_names).await?
        };

        Ok(CatalogOutcome::Listing(CatalogPage {
            products,
            search_term: selection.search_term,
            current_categories,
            current_sorting: selection.current_sorting,
            pager: Pager::new(
                total.max(0) as u64,
                selection.query.page(),
                selection.query.per_page(),
            ),
        }))
    }
}
