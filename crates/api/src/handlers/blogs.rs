//! Handlers for the public `/blogs` and admin `/admin/blogs` resources.

use std::collections::BTreeSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use storefront_core::error::{CoreError, FieldErrors};
use storefront_core::images::{OrderedImage, ParentRef};
use storefront_core::listing::{FilterSpec, ListingKind, Page, RawListingParams};
use storefront_core::types::DbId;
use storefront_db::models::blog::{Blog, BlogStatistics, CreateBlog, UpdateBlog};
use storefront_db::repositories::{BlogRepo, ImageRepo, ProductRepo};
use storefront_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::handlers::products::{with_primary_images, ProductView};
use crate::handlers::{check_category, derive_slug, push_field_error};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::validation::validate_with;

/// Number of entries in each statistics top list.
const STATISTICS_TOP_N: i64 = 5;

/// A blog with its images and attached products.
#[derive(Debug, Serialize)]
pub struct BlogView {
    #[serde(flatten)]
    pub blog: Blog,
    pub images: Vec<OrderedImage>,
    pub products: Vec<ProductView>,
}

/// Load images and attached products. `active_only` hides inactive
/// products on storefront responses.
async fn blog_view(pool: &DbPool, blog: Blog, active_only: bool) -> Result<BlogView, sqlx::Error> {
    let images = ImageRepo::list(pool, ParentRef::blog(blog.id))
        .await?
        .into_iter()
        .map(OrderedImage::from)
        .collect();
    let mut products = ProductRepo::list_for_blog(pool, blog.id).await?;
    if active_only {
        products.retain(|p| p.is_active);
    }
    let products = with_primary_images(pool, products).await?;
    Ok(BlogView {
        blog,
        images,
        products,
    })
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Blog", id })
}

/// Record an error when any of `product_ids` is not an existing product.
async fn check_products(
    pool: &DbPool,
    product_ids: Option<&[DbId]>,
    errors: &mut FieldErrors,
) -> Result<(), sqlx::Error> {
    let Some(ids) = product_ids else {
        return Ok(());
    };
    let wanted: BTreeSet<DbId> = ids.iter().copied().collect();
    let found = ProductRepo::list_by_ids(pool, ids).await?;
    if found.len() != wanted.len() {
        push_field_error(errors, "product_ids", "The selected product_ids is invalid.");
    }
    Ok(())
}

/// Counts plus the most viewed and most recent blogs.
pub(crate) async fn statistics_for(pool: &DbPool) -> Result<BlogStatistics, sqlx::Error> {
    Ok(BlogStatistics {
        counts: BlogRepo::counts(pool).await?,
        popular: BlogRepo::most_viewed(pool, STATISTICS_TOP_N).await?,
        recent: BlogRepo::most_recent(pool, STATISTICS_TOP_N).await?,
    })
}

// ---------------------------------------------------------------------------
// Public handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/blogs
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<RawListingParams>,
) -> AppResult<Json<Page<Blog>>> {
    let spec = FilterSpec::from_raw(ListingKind::PublishedBlogs, &params, false)?;
    let (blogs, total) = BlogRepo::list(&state.pool, &spec).await?;
    Ok(Json(Page::new(blogs, &spec, total)))
}

/// GET /api/v1/blogs/{slug}
///
/// Counts a view. The increment runs in the background and the response
/// already includes it.
pub async fn show_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<BlogView>>> {
    let mut blog = BlogRepo::find_published_by_slug(&state.pool, &slug)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFoundByKey {
                entity: "Blog",
                key: slug.clone(),
            })
        })?;

    let pool = state.pool.clone();
    let blog_id = blog.id;
    tokio::spawn(async move {
        if let Err(e) = BlogRepo::increment_views(&pool, blog_id).await {
            tracing::warn!(blog_id, error = %e, "Failed to record blog view");
        }
    });
    blog.views += 1;

    Ok(Json(DataResponse {
        data: blog_view(&state.pool, blog, true).await?,
    }))
}

// ---------------------------------------------------------------------------
// Admin handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/blogs
pub async fn admin_list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<RawListingParams>,
) -> AppResult<Json<Page<Blog>>> {
    let spec = FilterSpec::from_raw(ListingKind::Blogs, &params, true)?;
    let (blogs, total) = BlogRepo::list(&state.pool, &spec).await?;
    Ok(Json(Page::new(blogs, &spec, total)))
}

/// POST /api/v1/admin/blogs
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateBlog>,
) -> AppResult<(StatusCode, Json<DataResponse<BlogView>>)> {
    let mut extra = FieldErrors::new();
    check_category(&state.pool, "category_id", input.category_id, &mut extra).await?;
    check_products(&state.pool, input.product_ids.as_deref(), &mut extra).await?;
    let slug = derive_slug(&input.title, "title", &mut extra);
    validate_with(&input, extra)?;

    let blog = BlogRepo::create(&state.pool, &slug, admin.user_id, &input).await?;
    tracing::info!(blog_id = blog.id, author_id = admin.user_id, "Blog created");

    let view = blog_view(&state.pool, blog, false).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// GET /api/v1/admin/blogs/statistics
pub async fn statistics(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<BlogStatistics>>> {
    Ok(Json(DataResponse {
        data: statistics_for(&state.pool).await?,
    }))
}

/// GET /api/v1/admin/blogs/{id}
///
/// Does not count a view.
pub async fn admin_show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<BlogView>>> {
    let blog = BlogRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse {
        data: blog_view(&state.pool, blog, false).await?,
    }))
}

/// PUT /api/v1/admin/blogs/{id}
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBlog>,
) -> AppResult<Json<DataResponse<BlogView>>> {
    let current = BlogRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let mut extra = FieldErrors::new();
    check_category(&state.pool, "category_id", input.category_id, &mut extra).await?;
    check_products(&state.pool, input.product_ids.as_deref(), &mut extra).await?;
    let slug = match &input.title {
        Some(title) if *title != current.title => Some(derive_slug(title, "title", &mut extra)),
        _ => None,
    };
    validate_with(&input, extra)?;

    let blog = BlogRepo::update(&state.pool, id, slug.as_deref(), &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(blog_id = id, "Blog updated");

    Ok(Json(DataResponse {
        data: blog_view(&state.pool, blog, false).await?,
    }))
}

/// DELETE /api/v1/admin/blogs/{id}
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if BlogRepo::soft_delete(&state.pool, id).await? {
        tracing::info!(blog_id = id, "Blog deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// POST /api/v1/admin/blogs/{id}/restore
pub async fn restore(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<BlogView>>> {
    if !BlogRepo::restore(&state.pool, id).await? {
        return Err(not_found(id));
    }
    let blog = BlogRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(blog_id = id, "Blog restored");
    Ok(Json(DataResponse {
        data: blog_view(&state.pool, blog, false).await?,
    }))
}
