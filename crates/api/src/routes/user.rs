//! Route definitions for the `/user` resource.

use axum::routing::put;
use axum::Router;

use crate::handlers::profile;
use crate::state::AppState;

/// Routes mounted at `/user`. All require auth.
///
/// ```text
/// PUT /profile   -> update_profile
/// PUT /password  -> change_password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", put(profile::update_profile))
        .route("/password", put(profile::change_password))
}
