//! Product listing and detail routes.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use tower_sessions::Session;
use uuid::Uuid;

use crate::catalog::{CatalogOutcome, CatalogParams};
use crate::error::{AppError, AppResult};
use crate::models::{Category, Product};
use crate::state::AppState;

use super::helpers::{render_template, set_flash, take_flash};

/// Create the product listing router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/{id}", get(product_detail))
}

/// Product listing, including sorting, filtering, and search.
///
/// GET /?sort=&direction=&category=&q=
async fn list_products(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CatalogParams>,
) -> AppResult<Response> {
    let outcome = state.catalog().run(&params).await?;

    let page = match outcome {
        CatalogOutcome::Redirect { message, to } => {
            set_flash(&session, &message).await;
            return Ok(Redirect::to(&to).into_response());
        }
        CatalogOutcome::Listing(page) => page,
    };

    let flash = take_flash(&session).await;

    let mut context = tera::Context::new();
    context.insert("products", &page.products);
    context.insert("search_term", &page.search_term);
    context.insert("current_categories", &page.current_categories);
    context.insert("current_sorting", &page.current_sorting);
    context.insert("pager", &page.pager);
    context.insert("flash", &flash);

    Ok(render_template(&state, "products/list.html", &context))
}

/// Product detail page.
///
/// GET /{id}
async fn product_detail(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Response> {
    // A garbled id is indistinguishable from a missing product
    let product_id = Uuid::parse_str(&id).map_err(|_| AppError::NotFound)?;

    let product = Product::find_by_id(state.db(), product_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let category = match product.category_id {
        Some(category_id) => Category::find_by_id(state.db(), category_id).await?,
        None => None,
    };

    let flash = take_flash(&session).await;

    let mut context = tera::Context::new();
    context.insert("product", &product);
    context.insert("category", &category);
    context.insert("flash", &flash);

    Ok(render_template(&state, "products/detail.html", &context))
}
