//! Handlers for the `/user` resource (the caller's own account).

use axum::extract::State;
use axum::Json;
use storefront_core::error::{CoreError, FieldErrors};
use storefront_db::models::user::{ChangePassword, UpdateProfile};
use storefront_db::repositories::UserRepo;

use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::handlers::auth::UserView;
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;
use crate::validation::{validate, validate_with};

/// PUT /api/v1/user/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<UpdateProfile>,
) -> AppResult<Json<DataResponse<UserView>>> {
    let mut extra = FieldErrors::new();
    if let Some(email) = &input.email {
        if UserRepo::email_taken(&state.pool, email, auth_user.user_id).await? {
            extra.insert(
                "email".into(),
                vec!["The email has already been taken.".into()],
            );
        }
    }
    validate_with(&input, extra)?;

    let user = UserRepo::update_profile(&state.pool, auth_user.user_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth_user.user_id,
        }))?;

    tracing::info!(user_id = user.id, "Profile updated");
    Ok(Json(DataResponse { data: user.into() }))
}

/// PUT /api/v1/user/password
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<ChangePassword>,
) -> AppResult<Json<MessageResponse>> {
    validate(&input)?;

    let user = UserRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth_user.user_id,
        }))?;

    let current_ok = verify_password(&input.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !current_ok {
        return Err(AppError::Core(CoreError::field(
            "current_password",
            "The current password is incorrect.",
        )));
    }

    let hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&state.pool, user.id, &hash).await?;

    tracing::info!(user_id = user.id, "Password changed");
    Ok(Json(MessageResponse::new("Password updated successfully")))
}
