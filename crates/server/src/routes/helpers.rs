//! Shared route helpers: authorization, flash messages, page rendering.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use tower_sessions::Session;
use uuid::Uuid;

use crate::form::csrf::verify_csrf_token;
use crate::models::User;
use crate::state::AppState;

/// Session key for the authenticated user's id.
pub const SESSION_USER_ID: &str = "user_id";

/// Session key for one-shot flash messages.
const FLASH_KEY: &str = "flash";

/// Message shown when a caller without store-owner rights tries a mutation.
pub const DENIED_MESSAGE: &str = "Sorry, only store owners can do that.";

/// Whether a user may create, edit, or delete products.
///
/// The single authorization predicate composed with each mutation route.
pub fn can_manage_products(user: &User) -> bool {
    user.is_superuser || user.is_staff
}

/// Load the current user from the session, if any.
pub async fn current_user(state: &AppState, session: &Session) -> Option<User> {
    let user_id: Option<Uuid> = session.get(SESSION_USER_ID).await.ok().flatten();
    let id = user_id?;
    User::find_by_id(state.db(), id).await.ok().flatten()
}

/// Require a caller allowed to manage products, or redirect home with a
/// flash denial. Used by the add-product routes.
pub async fn require_manager_or_home(
    state: &AppState,
    session: &Session,
) -> Result<User, Response> {
    match current_user(state, session).await {
        Some(user) if can_manage_products(&user) => Ok(user),
        _ => {
            set_flash(session, DENIED_MESSAGE).await;
            Err(Redirect::to("/").into_response())
        }
    }
}

/// Require a caller allowed to manage products, or respond 403.
/// Used by the edit and delete routes.
pub async fn require_manager(state: &AppState, session: &Session) -> Result<User, Response> {
    match current_user(state, session).await {
        Some(user) if can_manage_products(&user) => Ok(user),
        _ => Err((StatusCode::FORBIDDEN, Html("Access denied")).into_response()),
    }
}

/// Verify a submitted CSRF token, or respond 403.
pub async fn require_csrf(session: &Session, submitted: &str) -> Result<(), Response> {
    match verify_csrf_token(session, submitted).await {
        Ok(true) => Ok(()),
        Ok(false) => Err((StatusCode::FORBIDDEN, Html("Invalid form token")).into_response()),
        Err(e) => {
            tracing::warn!(error = %e, "CSRF verification failed");
            Err((StatusCode::FORBIDDEN, Html("Invalid form token")).into_response())
        }
    }
}

/// Store a one-shot flash message in the session.
pub async fn set_flash(session: &Session, message: &str) {
    let _ = session.insert(FLASH_KEY, message).await;
}

/// Read and clear the flash message, if one is pending.
pub async fn take_flash(session: &Session) -> Option<String> {
    let flash: Option<String> = session.get(FLASH_KEY).await.ok().flatten();
    if flash.is_some() {
        let _ = session.remove::<String>(FLASH_KEY).await;
    }
    flash
}

/// Render a template with the given context, or a 500 page on failure.
pub fn render_template(state: &AppState, template: &str, context: &tera::Context) -> Response {
    match state.theme().tera().render(template, context) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, template = %template, "failed to render template");
            render_server_error("Something went wrong rendering this page.")
        }
    }
}

/// A plain 404 page.
pub fn render_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Html("<!DOCTYPE html><html><head><title>Not Found</title></head><body><h1>Not Found</h1></body></html>".to_string()),
    )
        .into_response()
}

/// A plain 500 page with a safe message.
pub fn render_server_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!(
            "<!DOCTYPE html><html><head><title>Error</title></head><body><h1>Error</h1><p>{}</p></body></html>",
            html_escape(message)
        )),
    )
        .into_response()
}

/// HTML-escape a string for safe output.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
