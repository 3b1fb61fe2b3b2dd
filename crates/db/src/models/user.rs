//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storefront_core::roles::role_for;
use storefront_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Role name used in access tokens.
    pub fn role(&self) -> &'static str {
        role_for(self.is_admin)
    }
}

/// DTO for inserting a user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub is_admin: bool,
}

/// DTO for `PUT /user/profile`. All fields are optional.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfile {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
}

/// DTO for `PUT /user/password`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePassword {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(
        length(min = 8, message = "The password must be at least 8 characters."),
        must_match(other = "password_confirmation", message = "The password confirmation does not match.")
    )]
    pub password: String,
    pub password_confirmation: String,
}

/// DTO for `PUT /admin/users/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserStatus {
    pub is_active: bool,
}
