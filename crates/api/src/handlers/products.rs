//! Handlers for the public `/products` and admin `/admin/products` resources.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;
use storefront_core::error::CoreError;
use storefront_core::images::{OrderedImage, ParentRef};
use storefront_core::listing::{FilterSpec, ListingKind, Page, RawListingParams};
use storefront_core::slug::strip_tags;
use storefront_core::types::DbId;
use storefront_db::models::product::{CreateProduct, Product, UpdateProduct};
use storefront_db::repositories::{ImageRepo, ProductRepo};
use storefront_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::handlers::{check_category, derive_slug};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::validation::validate_with;

// ---------------------------------------------------------------------------
// Response shape
// ---------------------------------------------------------------------------

/// A product with its derived pricing/stock fields and images.
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub effective_price: Decimal,
    pub is_on_sale: bool,
    pub is_in_stock: bool,
    pub is_low_stock: bool,
    pub primary_image: Option<OrderedImage>,
    /// Present on single-product responses only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<OrderedImage>>,
}

impl ProductView {
    fn new(
        product: Product,
        primary_image: Option<OrderedImage>,
        images: Option<Vec<OrderedImage>>,
    ) -> Self {
        Self {
            effective_price: product.effective_price(),
            is_on_sale: product.is_on_sale(),
            is_in_stock: product.is_in_stock(),
            is_low_stock: product.is_low_stock(),
            product,
            primary_image,
            images,
        }
    }
}

/// Attach each product's primary image (one query for the whole page).
pub(crate) async fn with_primary_images(
    pool: &DbPool,
    products: Vec<Product>,
) -> Result<Vec<ProductView>, sqlx::Error> {
    let ids: Vec<DbId> = products.iter().map(|p| p.id).collect();
    let mut primaries: HashMap<DbId, OrderedImage> = ImageRepo::primary_for_products(pool, &ids)
        .await?
        .into_iter()
        .map(|row| (row.parent_id, OrderedImage::from(row)))
        .collect();
    Ok(products
        .into_iter()
        .map(|p| {
            let primary = primaries.remove(&p.id);
            ProductView::new(p, primary, None)
        })
        .collect())
}

/// A single product with its full image list.
async fn with_images(pool: &DbPool, product: Product) -> Result<ProductView, sqlx::Error> {
    let images: Vec<OrderedImage> = ImageRepo::list(pool, ParentRef::product(product.id))
        .await?
        .into_iter()
        .map(OrderedImage::from)
        .collect();
    let primary = images.iter().find(|img| img.is_primary).cloned();
    Ok(ProductView::new(product, primary, Some(images)))
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Product",
        id,
    })
}

async fn list_page(state: &AppState, spec: FilterSpec) -> AppResult<Page<ProductView>> {
    let (products, total) = ProductRepo::list(&state.pool, &spec).await?;
    let page = Page::new(products, &spec, total);
    let data = with_primary_images(&state.pool, page.data).await?;
    Ok(Page {
        data,
        meta: page.meta,
    })
}

/// Products listing restricted to active rows, optionally within a category.
pub(crate) async fn public_listing(
    state: &AppState,
    params: &RawListingParams,
    category_id: Option<DbId>,
) -> AppResult<Page<ProductView>> {
    let mut spec = FilterSpec::from_raw(ListingKind::Products, params, false)?;
    if let Some(id) = category_id {
        spec = spec.with_category(id);
    }
    list_page(state, spec).await
}

// ---------------------------------------------------------------------------
// Public handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/products
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<RawListingParams>,
) -> AppResult<Json<Page<ProductView>>> {
    Ok(Json(public_listing(&state, &params, None).await?))
}

/// GET /api/v1/products/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProductView>>> {
    let product = ProductRepo::find_active_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse {
        data: with_images(&state.pool, product).await?,
    }))
}

// ---------------------------------------------------------------------------
// Admin handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/products
pub async fn admin_list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<RawListingParams>,
) -> AppResult<Json<Page<ProductView>>> {
    let spec = FilterSpec::from_raw(ListingKind::Products, &params, true)?;
    Ok(Json(list_page(&state, spec).await?))
}

/// POST /api/v1/admin/products
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(mut input): Json<CreateProduct>,
) -> AppResult<(StatusCode, Json<DataResponse<ProductView>>)> {
    let mut extra = input.amount_errors();
    check_category(&state.pool, "category_id", input.category_id, &mut extra).await?;
    let slug = derive_slug(&input.name, "name", &mut extra);
    validate_with(&input, extra)?;

    input.short_description = input.short_description.as_deref().map(strip_tags);

    let product = ProductRepo::create(&state.pool, &slug, admin.user_id, &input).await?;
    tracing::info!(product_id = product.id, agent_id = admin.user_id, "Product created");

    let view = with_images(&state.pool, product).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// GET /api/v1/admin/products/{id}
pub async fn admin_show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProductView>>> {
    let product = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse {
        data: with_images(&state.pool, product).await?,
    }))
}

/// PUT /api/v1/admin/products/{id}
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateProduct>,
) -> AppResult<Json<DataResponse<ProductView>>> {
    let current = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let mut extra = input.amount_errors(current.price);
    check_category(&state.pool, "category_id", input.category_id, &mut extra).await?;
    let slug = match &input.name {
        Some(name) if *name != current.name => Some(derive_slug(name, "name", &mut extra)),
        _ => None,
    };
    validate_with(&input, extra)?;

    input.short_description = input.short_description.as_deref().map(strip_tags);

    let product = ProductRepo::update(&state.pool, id, slug.as_deref(), &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(product_id = id, "Product updated");

    Ok(Json(DataResponse {
        data: with_images(&state.pool, product).await?,
    }))
}

/// DELETE /api/v1/admin/products/{id}
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if ProductRepo::soft_delete(&state.pool, id).await? {
        tracing::info!(product_id = id, "Product deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// POST /api/v1/admin/products/{id}/restore
pub async fn restore(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProductView>>> {
    if !ProductRepo::restore(&state.pool, id).await? {
        return Err(not_found(id));
    }
    let product = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(product_id = id, "Product restored");
    Ok(Json(DataResponse {
        data: with_images(&state.pool, product).await?,
    }))
}
