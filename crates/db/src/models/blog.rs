//! Blog entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storefront_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `blogs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Blog {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub category_id: Option<DbId>,
    pub author_id: Option<DbId>,
    pub featured_image: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub views: i64,
    pub is_published: bool,
    pub published_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a blog. The slug is derived from `title` and the author
/// is the authenticated caller.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBlog {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    #[validate(length(min = 1))]
    pub content: String,
    pub category_id: Option<DbId>,
    #[validate(length(max = 255))]
    pub featured_image: Option<String>,
    #[validate(length(max = 255))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
    #[validate(length(max = 255))]
    pub meta_keywords: Option<String>,
    pub is_published: Option<bool>,
    pub published_at: Option<Timestamp>,
    /// Featured products, in display order.
    pub product_ids: Option<Vec<DbId>>,
}

/// DTO for updating a blog. All fields are optional; `product_ids`, when
/// present, replaces the attached products.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBlog {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    pub category_id: Option<DbId>,
    #[validate(length(max = 255))]
    pub featured_image: Option<String>,
    #[validate(length(max = 255))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
    #[validate(length(max = 255))]
    pub meta_keywords: Option<String>,
    pub is_published: Option<bool>,
    pub published_at: Option<Timestamp>,
    pub product_ids: Option<Vec<DbId>>,
}

/// Compact blog row used in statistics lists.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BlogSummary {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub views: i64,
    pub is_published: bool,
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Aggregate blog counts.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BlogCounts {
    pub total: i64,
    pub published: i64,
    pub draft: i64,
    pub total_views: i64,
}

/// Response body for `GET /admin/blogs/statistics`.
#[derive(Debug, Clone, Serialize)]
pub struct BlogStatistics {
    #[serde(flatten)]
    pub counts: BlogCounts,
    pub popular: Vec<BlogSummary>,
    pub recent: Vec<BlogSummary>,
}
