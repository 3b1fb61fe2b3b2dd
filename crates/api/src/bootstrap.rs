//! Startup provisioning of the admin account.
//!
//! Self-registration is disabled, so the first admin comes from
//! `ADMIN_EMAIL` / `ADMIN_PASSWORD`.

use storefront_db::models::user::CreateUser;
use storefront_db::repositories::UserRepo;
use storefront_db::DbPool;

use crate::auth::password::{hash_password, MIN_PASSWORD_LENGTH};
use crate::config::AdminBootstrap;
use crate::error::{AppError, AppResult};

/// Create the configured admin unless a user with that email exists.
/// Returns `true` when an account was created.
pub async fn ensure_admin(pool: &DbPool, admin: &AdminBootstrap) -> AppResult<bool> {
    if let Some(existing) = UserRepo::find_by_email(pool, &admin.email).await? {
        if !existing.is_admin {
            tracing::warn!(
                user_id = existing.id,
                "Bootstrap admin email belongs to a non-admin user"
            );
        }
        return Ok(false);
    }

    if admin.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "ADMIN_PASSWORD must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let password_hash = hash_password(&admin.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    let user = UserRepo::create(
        pool,
        &CreateUser {
            name: "Administrator".into(),
            email: admin.email.clone(),
            password_hash,
            phone: None,
            is_admin: true,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "Admin account created");
    Ok(true)
}
