//! Route definitions for the `/admin` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{dashboard, users};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require the `admin` role (enforced by handler extractors).
///
/// ```text
/// GET /dashboard/stats     -> dashboard::stats
/// GET /users               -> users::list
/// PUT /users/{id}/status   -> users::set_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/users", get(users::list))
        .route("/users/{id}/status", put(users::set_status))
}
