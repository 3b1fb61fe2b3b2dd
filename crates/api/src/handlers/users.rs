//! Admin handlers for the `/admin/users` resource.

use axum::extract::{Path, Query, State};
use axum::Json;
use storefront_core::error::CoreError;
use storefront_core::listing::{FilterSpec, ListingKind, Page, RawListingParams};
use storefront_core::types::DbId;
use storefront_db::models::user::UpdateUserStatus;
use storefront_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::auth::UserView;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/users
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<RawListingParams>,
) -> AppResult<Json<Page<UserView>>> {
    let spec = FilterSpec::from_raw(ListingKind::Users, &params, true)?;
    let (users, total) = UserRepo::list(&state.pool, &spec).await?;
    Ok(Json(Page::new(users, &spec, total).map(UserView::from)))
}

/// PUT /api/v1/admin/users/{id}/status
///
/// Admins cannot deactivate their own account.
pub async fn set_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserStatus>,
) -> AppResult<Json<DataResponse<UserView>>> {
    if id == admin.user_id && !input.is_active {
        return Err(AppError::Core(CoreError::Conflict(
            "You cannot deactivate your own account".into(),
        )));
    }

    let user = UserRepo::set_active(&state.pool, id, input.is_active)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    tracing::info!(
        user_id = user.id,
        is_active = user.is_active,
        admin_id = admin.user_id,
        "User status changed"
    );
    Ok(Json(DataResponse { data: user.into() }))
}
