//! Aggregate rows for the admin dashboard.

use serde::Serialize;
use sqlx::FromRow;

/// Product counts by status.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductCounts {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub featured: i64,
    /// `0 < stock_quantity <= min_stock_level`.
    pub low_stock: i64,
    pub out_of_stock: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserCounts {
    pub total: i64,
    /// Users created since the start of the current calendar month (UTC).
    pub new_this_month: i64,
}
