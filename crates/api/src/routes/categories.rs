//! Route definitions for categories.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::categories;
use crate::state::AppState;

/// Public routes mounted at `/categories`.
///
/// ```text
/// GET /                 -> list (?parent_only)
/// GET /{id}/products    -> products
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list))
        .route("/{id}/products", get(categories::products))
}

/// Admin routes mounted at `/admin/categories`.
///
/// ```text
/// POST   /       -> create
/// PUT    /{id}   -> update
/// DELETE /{id}   -> delete
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(categories::create))
        .route("/{id}", put(categories::update).delete(categories::delete))
}
