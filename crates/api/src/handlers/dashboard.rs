//! Handler for the admin dashboard summary.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use storefront_db::models::blog::BlogStatistics;
use storefront_db::models::dashboard::{ProductCounts, UserCounts};
use storefront_db::repositories::DashboardRepo;

use crate::error::AppResult;
use crate::handlers::blogs::statistics_for;
use crate::handlers::products::{with_primary_images, ProductView};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

const RECENT_PRODUCTS_LIMIT: i64 = 10;
const LOW_STOCK_LIMIT: i64 = 10;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub products: ProductCounts,
    pub users: UserCounts,
    pub blogs: BlogStatistics,
    pub recent_products: Vec<ProductView>,
    pub low_stock_alerts: Vec<ProductView>,
}

/// GET /api/v1/admin/dashboard/stats
pub async fn stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<DashboardStats>>> {
    let pool = &state.pool;

    let products = DashboardRepo::product_counts(pool).await?;
    let users = DashboardRepo::user_counts(pool).await?;
    let blogs = statistics_for(pool).await?;
    let recent = DashboardRepo::recent_products(pool, RECENT_PRODUCTS_LIMIT).await?;
    let low_stock = DashboardRepo::low_stock_alerts(pool, LOW_STOCK_LIMIT).await?;

    Ok(Json(DataResponse {
        data: DashboardStats {
            products,
            users,
            blogs,
            recent_products: with_primary_images(pool, recent).await?,
            low_stock_alerts: with_primary_images(pool, low_stock).await?,
        },
    }))
}
