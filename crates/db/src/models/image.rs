//! Row shape shared by `product_images` and `blog_images`.

use sqlx::FromRow;
use storefront_core::images::OrderedImage;
use storefront_core::types::{DbId, Timestamp};

/// An image row with the parent key aliased to `parent_id`.
///
/// `product_images` has no `caption` and `blog_images` has no `is_primary`;
/// the missing column is selected as a constant.
#[derive(Debug, Clone, FromRow)]
pub struct ImageRow {
    pub id: DbId,
    pub parent_id: DbId,
    pub path: String,
    pub filename: String,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub sort_order: i32,
    pub is_primary: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ImageRow> for OrderedImage {
    fn from(row: ImageRow) -> Self {
        OrderedImage {
            id: row.id,
            parent_id: row.parent_id,
            path: row.path,
            filename: row.filename,
            alt_text: row.alt_text,
            caption: row.caption,
            sort_order: row.sort_order,
            is_primary: row.is_primary,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
