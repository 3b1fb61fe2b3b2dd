//! Category entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storefront_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<DbId>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A category with its active direct children, as returned by the public
/// category listing.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTree {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<Category>,
}

/// DTO for creating a category. The slug is derived from `name`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub image: Option<String>,
    pub parent_id: Option<DbId>,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// DTO for updating a category. All fields are optional.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub image: Option<String>,
    pub parent_id: Option<DbId>,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}
