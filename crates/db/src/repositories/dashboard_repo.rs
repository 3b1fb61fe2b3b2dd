//! Aggregate queries for the admin dashboard.

use sqlx::PgPool;

use crate::models::dashboard::{ProductCounts, UserCounts};
use crate::models::product::Product;
use crate::repositories::product_repo::COLUMNS as PRODUCT_COLUMNS;

/// Read-only statistics over products and users.
pub struct DashboardRepo;

impl DashboardRepo {
    /// Product counts by status, excluding soft-deleted rows.
    pub async fn product_counts(pool: &PgPool) -> Result<ProductCounts, sqlx::Error> {
        sqlx::query_as::<_, ProductCounts>(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE is_active) AS active,
                COUNT(*) FILTER (WHERE NOT is_active) AS inactive,
                COUNT(*) FILTER (WHERE is_featured) AS featured,
                COUNT(*) FILTER (WHERE stock_quantity > 0
                                   AND stock_quantity <= min_stock_level) AS low_stock,
                COUNT(*) FILTER (WHERE stock_quantity = 0) AS out_of_stock
             FROM products
             WHERE deleted_at IS NULL",
        )
        .fetch_one(pool)
        .await
    }

    /// Total users and users created since the start of this month (UTC).
    pub async fn user_counts(pool: &PgPool) -> Result<UserCounts, sqlx::Error> {
        sqlx::query_as::<_, UserCounts>(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (
                    WHERE created_at >= date_trunc('month', NOW() AT TIME ZONE 'UTC')
                                        AT TIME ZONE 'UTC'
                ) AS new_this_month
             FROM users",
        )
        .fetch_one(pool)
        .await
    }

    /// The most recently created products.
    pub async fn recent_products(pool: &PgPool, limit: i64) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE deleted_at IS NULL
             ORDER BY created_at DESC, id DESC
             LIMIT $1"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Active, in-stock products at or below their minimum stock level,
    /// lowest stock first.
    pub async fn low_stock_alerts(pool: &PgPool, limit: i64) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE deleted_at IS NULL AND is_active
               AND stock_quantity > 0 AND stock_quantity <= min_stock_level
             ORDER BY stock_quantity ASC, id ASC
             LIMIT $1"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
