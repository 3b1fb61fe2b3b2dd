//! Shared query parameter types for API handlers.
//!
//! Listing endpoints take [`storefront_core::listing::RawListingParams`]
//! directly; the structs here cover the remaining endpoints.

use serde::Deserialize;
use storefront_core::listing::{parse_flag, supplied};

/// `GET /categories?parent_only=`.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryListParams {
    pub parent_only: Option<String>,
}

impl CategoryListParams {
    pub fn parent_only(&self) -> bool {
        supplied(&self.parent_only).is_some_and(parse_flag)
    }
}
