//! Product management routes: add, edit, delete.
//!
//! All three are gated on the store-owner predicate. Add failures redirect
//! home with a flash denial; edit and delete failures are plain 403s.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::form::csrf::generate_csrf_token;
use crate::models::{Category, CreateProduct, Product, UpdateProduct};
use crate::state::AppState;

use super::helpers::{
    render_not_found, render_server_error, render_template, require_csrf, require_manager,
    require_manager_or_home, set_flash,
};

/// Create the product management router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add", get(add_product_form).post(add_product_submit))
        .route("/edit/{id}", get(edit_product_form).post(edit_product_submit))
        .route(
            "/delete/{id}",
            get(delete_product_confirm).post(delete_product_submit),
        )
}

/// Product form data.
#[derive(Debug, Deserialize)]
struct ProductFormData {
    #[serde(rename = "_token")]
    token: String,
    sku: Option<String>,
    name: String,
    description: String,
    price: String,
    category: Option<String>,
    image_url: Option<String>,
    rating: Option<String>,
}

/// Validated form values ready for persistence.
#[derive(Debug, PartialEq)]
struct ParsedProductForm {
    sku: Option<String>,
    name: String,
    description: String,
    price_cents: i64,
    rating: Option<f64>,
    image_url: Option<String>,
}

/// Parse a decimal price string into cents.
///
/// Accepts at most two fraction digits; rejects negatives and non-digits.
fn parse_price_cents(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    let (whole, frac) = match trimmed.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (trimmed, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || whole.len() > 12 {
        return None;
    }
    if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole_cents = if whole.is_empty() {
        0
    } else {
        whole.parse::<i64>().ok()? * 100
    };
    let frac_cents = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse::<i64>().ok()?,
    };

    Some(whole_cents + frac_cents)
}

/// Validate submitted form values. Category existence is checked separately
/// since it needs the store.
fn validate_product_form(form: &ProductFormData) -> Result<ParsedProductForm, Vec<String>> {
    let mut errors = Vec::new();

    let name = form.name.trim().to_string();
    if name.is_empty() {
        errors.push("Name is required.".to_string());
    } else if name.chars().count() > 254 {
        errors.push("Name must be 254 characters or fewer.".to_string());
    }

    let description = form.description.trim().to_string();
    if description.is_empty() {
        errors.push("Description is required.".to_string());
    }

    let price_cents = match parse_price_cents(&form.price) {
        Some(cents) => cents,
        None => {
            errors.push("Enter a valid price, e.g. 24.99.".to_string());
            0
        }
    };

    let rating = match form.rating.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) if (0.0..=5.0).contains(&value) => Some(value),
            _ => {
                errors.push("Rating must be a number between 0 and 5.".to_string());
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ParsedProductForm {
        sku: non_empty(form.sku.as_deref()),
        name,
        description,
        price_cents,
        rating,
        image_url: non_empty(form.image_url.as_deref()),
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Resolve the submitted category name, collecting an error when it does
/// not name an existing category.
async fn resolve_category(
    state: &AppState,
    submitted: Option<&str>,
    errors: &mut Vec<String>,
) -> Option<Uuid> {
    let name = submitted.map(str::trim).filter(|s| !s.is_empty())?;

    match Category::find_by_name(state.db(), name).await {
        Ok(Some(category)) => Some(category.id),
        Ok(None) => {
            errors.push("Select a valid category.".to_string());
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to resolve category");
            errors.push("Select a valid category.".to_string());
            None
        }
    }
}

/// Render the product form with the given values and errors.
async fn render_product_form(
    state: &AppState,
    session: &Session,
    action: &str,
    editing: bool,
    values: &serde_json::Value,
    errors: &[String],
) -> Response {
    let categories = Category::list(state.db()).await.unwrap_or_default();
    let csrf_token = generate_csrf_token(session).await.unwrap_or_default();

    let mut context = tera::Context::new();
    context.insert("action", action);
    context.insert("editing", &editing);
    context.insert("categories", &categories);
    context.insert("csrf_token", &csrf_token);
    context.insert("values", values);
    context.insert("errors", errors);

    render_template(state, "products/form.html", &context)
}

/// Form values echoed back after a validation failure.
fn form_values(form: &ProductFormData) -> serde_json::Value {
    serde_json::json!({
        "sku": form.sku,
        "name": form.name,
        "description": form.description,
        "price": form.price,
        "category": form.category,
        "image_url": form.image_url,
        "rating": form.rating,
    })
}

/// Show the add-product form.
///
/// GET /add
async fn add_product_form(State(state): State<AppState>, session: Session) -> Response {
    if let Err(denied) = require_manager_or_home(&state, &session).await {
        return denied;
    }

    render_product_form(
        &state,
        &session,
        "/add",
        false,
        &serde_json::json!({}),
        &[],
    )
    .await
}

/// Handle add-product form submission.
///
/// POST /add
async fn add_product_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductFormData>,
) -> Response {
    if let Err(denied) = require_manager_or_home(&state, &session).await {
        return denied;
    }

    if let Err(resp) = require_csrf(&session, &form.token).await {
        return resp;
    }

    let mut errors = Vec::new();
    let parsed = match validate_product_form(&form) {
        Ok(parsed) => Some(parsed),
        Err(validation_errors) => {
            errors.extend(validation_errors);
            None
        }
    };
    let category_id = resolve_category(&state, form.category.as_deref(), &mut errors).await;

    let (Some(parsed), true) = (parsed, errors.is_empty()) else {
        return render_product_form(&state, &session, "/add", false, &form_values(&form), &errors)
            .await;
    };

    let input = CreateProduct {
        sku: parsed.sku,
        name: parsed.name,
        description: parsed.description,
        category_id,
        price_cents: parsed.price_cents,
        rating: parsed.rating,
        image_url: parsed.image_url,
    };

    match Product::create(state.db(), input).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "product created");
            set_flash(&session, "Successfully added product!").await;
            Redirect::to(&format!("/{}", product.id)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to create product");
            render_server_error("Failed to add product.")
        }
    }
}

/// Show the edit-product form.
///
/// GET /edit/{id}
async fn edit_product_form(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<Uuid>,
) -> Response {
    if let Err(denied) = require_manager(&state, &session).await {
        return denied;
    }

    let Some(product) = Product::find_by_id(state.db(), product_id)
        .await
        .ok()
        .flatten()
    else {
        return render_not_found();
    };

    let category_name = match product.category_id {
        Some(category_id) => Category::find_by_id(state.db(), category_id)
            .await
            .ok()
            .flatten()
            .map(|c| c.name),
        None => None,
    };

    let values = serde_json::json!({
        "sku": product.sku,
        "name": product.name,
        "description": product.description,
        "price": product.price_display(),
        "category": category_name,
        "image_url": product.image_url,
        "rating": product.rating.map(|r| r.to_string()),
    });

    let action = format!("/edit/{product_id}");
    render_product_form(&state, &session, &action, true, &values, &[]).await
}

/// Handle edit-product form submission.
///
/// POST /edit/{id}
async fn edit_product_submit(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<Uuid>,
    Form(form): Form<ProductFormData>,
) -> Response {
    if let Err(denied) = require_manager(&state, &session).await {
        return denied;
    }

    if let Err(resp) = require_csrf(&session, &form.token).await {
        return resp;
    }

    if Product::find_by_id(state.db(), product_id)
        .await
        .ok()
        .flatten()
        .is_none()
    {
        return render_not_found();
    }

    let mut errors = Vec::new();
    let parsed = match validate_product_form(&form) {
        Ok(parsed) => Some(parsed),
        Err(validation_errors) => {
            errors.extend(validation_errors);
            None
        }
    };
    let category_id = resolve_category(&state, form.category.as_deref(), &mut errors).await;

    let (Some(parsed), true) = (parsed, errors.is_empty()) else {
        let action = format!("/edit/{product_id}");
        return render_product_form(&state, &session, &action, true, &form_values(&form), &errors)
            .await;
    };

    let input = UpdateProduct {
        sku: Some(parsed.sku),
        name: Some(parsed.name),
        description: Some(parsed.description),
        category_id: Some(category_id),
        price_cents: Some(parsed.price_cents),
        rating: Some(parsed.rating),
        image_url: Some(parsed.image_url),
    };

    match Product::update(state.db(), product_id, input).await {
        Ok(Some(product)) => {
            tracing::info!(product_id = %product.id, "product updated");
            set_flash(&session, "Successfully updated product!").await;
            Redirect::to(&format!("/{}", product.id)).into_response()
        }
        Ok(None) => render_not_found(),
        Err(e) => {
            tracing::error!(error = %e, "failed to update product");
            render_server_error("Failed to update product.")
        }
    }
}

/// Show the delete confirmation page.
///
/// GET /delete/{id}
async fn delete_product_confirm(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<Uuid>,
) -> Response {
    if let Err(denied) = require_manager(&state, &session).await {
        return denied;
    }

    let Some(product) = Product::find_by_id(state.db(), product_id)
        .await
        .ok()
        .flatten()
    else {
        return render_not_found();
    };

    let csrf_token = generate_csrf_token(&session).await.unwrap_or_default();

    let mut context = tera::Context::new();
    context.insert("product", &product);
    context.insert("csrf_token", &csrf_token);

    render_template(&state, "products/delete-confirm.html", &context)
}

/// Handle product deletion.
///
/// POST /delete/{id}
async fn delete_product_submit(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<Uuid>,
    Form(form): Form<DeleteFormData>,
) -> Response {
    if let Err(denied) = require_manager(&state, &session).await {
        return denied;
    }

    if let Err(resp) = require_csrf(&session, &form.token).await {
        return resp;
    }

    match Product::delete(state.db(), product_id).await {
        Ok(true) => {
            tracing::info!(product_id = %product_id, "product deleted");
            set_flash(&session, "Product deleted!").await;
            Redirect::to("/").into_response()
        }
        Ok(false) => render_not_found(),
        Err(e) => {
            tracing::error!(error = %e, "failed to delete product");
            render_server_error("Failed to delete product.")
        }
    }
}

/// Delete form carries only the CSRF token.
#[derive(Debug, Deserialize)]
struct DeleteFormData {
    #[serde(rename = "_token")]
    token: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn form(name: &str, description: &str, price: &str) -> ProductFormData {
        ProductFormData {
            token: "token".to_string(),
            sku: None,
            name: name.to_string(),
            description: description.to_string(),
            price: price.to_string(),
            category: None,
            image_url: None,
            rating: None,
        }
    }

    #[test]
    fn parse_price_whole_and_fraction() {
        assert_eq!(parse_price_cents("24.99"), Some(2499));
        assert_eq!(parse_price_cents("24"), Some(2400));
        assert_eq!(parse_price_cents("24.9"), Some(2490));
        assert_eq!(parse_price_cents("0.05"), Some(5));
        assert_eq!(parse_price_cents(".50"), Some(50));
        assert_eq!(parse_price_cents(" 12.00 "), Some(1200));
    }

    #[test]
    fn parse_price_rejects_bad_input() {
        assert_eq!(parse_price_cents(""), None);
        assert_eq!(parse_price_cents("."), None);
        assert_eq!(parse_price_cents("-5"), None);
        assert_eq!(parse_price_cents("24.999"), None);
        assert_eq!(parse_price_cents("abc"), None);
        assert_eq!(parse_price_cents("12,50"), None);
    }

    #[test]
    fn valid_form_parses() {
        let parsed = validate_product_form(&form("Chess Set", "A nice set.", "54.99")).unwrap();

        assert_eq!(parsed.name, "Chess Set");
        assert_eq!(parsed.price_cents, 5499);
        assert_eq!(parsed.rating, None);
    }

    #[test]
    fn missing_name_is_an_error() {
        let errors = validate_product_form(&form("  ", "A nice set.", "54.99")).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("Name")));
    }

    #[test]
    fn missing_description_is_an_error() {
        let errors = validate_product_form(&form("Chess Set", "", "54.99")).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("Description")));
    }

    #[test]
    fn invalid_price_is_an_error() {
        let errors = validate_product_form(&form("Chess Set", "A nice set.", "cheap")).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("price")));
    }

    #[test]
    fn overlong_name_is_an_error() {
        let long_name = "x".repeat(255);
        let errors = validate_product_form(&form(&long_name, "desc", "1.00")).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("254")));
    }

    #[test]
    fn rating_bounds_are_checked() {
        let mut data = form("Chess Set", "A nice set.", "54.99");
        data.rating = Some("4.5".to_string());
        assert_eq!(validate_product_form(&data).unwrap().rating, Some(4.5));

        data.rating = Some("7".to_string());
        assert!(validate_product_form(&data).is_err());
    }

    #[test]
    fn optional_fields_drop_when_blank() {
        let mut data = form("Chess Set", "A nice set.", "54.99");
        data.sku = Some("  ".to_string());
        data.image_url = Some(String::new());

        let parsed = validate_product_form(&data).unwrap();
        assert_eq!(parsed.sku, None);
        assert_eq!(parsed.image_url, None);
    }
}
