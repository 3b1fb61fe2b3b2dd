//! Handlers for the public `/categories` and admin `/admin/categories` resources.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use storefront_core::error::{CoreError, FieldErrors};
use storefront_core::listing::{Page, RawListingParams};
use storefront_core::types::DbId;
use storefront_db::models::category::{Category, CategoryTree, CreateCategory, UpdateCategory};
use storefront_db::repositories::CategoryRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::products::{public_listing, ProductView};
use crate::handlers::{check_category, derive_slug, push_field_error};
use crate::middleware::rbac::RequireAdmin;
use crate::query::CategoryListParams;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::validation::validate_with;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Category",
        id,
    })
}

/// GET /api/v1/categories
///
/// Active categories, each with its active direct children.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<CategoryListParams>,
) -> AppResult<Json<DataResponse<Vec<CategoryTree>>>> {
    let categories = CategoryRepo::list_active(&state.pool, params.parent_only()).await?;
    let ids: Vec<DbId> = categories.iter().map(|c| c.id).collect();

    let mut children: HashMap<DbId, Vec<Category>> = HashMap::new();
    for child in CategoryRepo::list_active_children(&state.pool, &ids).await? {
        if let Some(parent_id) = child.parent_id {
            children.entry(parent_id).or_default().push(child);
        }
    }

    let data = categories
        .into_iter()
        .map(|category| CategoryTree {
            children: children.remove(&category.id).unwrap_or_default(),
            category,
        })
        .collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/categories/{id}/products
pub async fn products(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<RawListingParams>,
) -> AppResult<Json<Page<ProductView>>> {
    CategoryRepo::find_active_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(public_listing(&state, &params, Some(id)).await?))
}

/// POST /api/v1/admin/categories
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateCategory>,
) -> AppResult<(StatusCode, Json<DataResponse<Category>>)> {
    let mut extra = FieldErrors::new();
    check_category(&state.pool, "parent_id", input.parent_id, &mut extra).await?;
    let slug = derive_slug(&input.name, "name", &mut extra);
    validate_with(&input, extra)?;

    let category = CategoryRepo::create(&state.pool, &slug, &input).await?;
    tracing::info!(category_id = category.id, "Category created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// PUT /api/v1/admin/categories/{id}
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCategory>,
) -> AppResult<Json<DataResponse<Category>>> {
    let current = CategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let mut extra = FieldErrors::new();
    if input.parent_id == Some(id) {
        push_field_error(
            &mut extra,
            "parent_id",
            "A category cannot be its own parent.",
        );
    } else {
        check_category(&state.pool, "parent_id", input.parent_id, &mut extra).await?;
    }
    let slug = match &input.name {
        Some(name) if *name != current.name => Some(derive_slug(name, "name", &mut extra)),
        _ => None,
    };
    validate_with(&input, extra)?;

    let category = CategoryRepo::update(&state.pool, id, slug.as_deref(), &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(category_id = id, "Category updated");
    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/v1/admin/categories/{id}
///
/// Refused while products still reference the category.
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if CategoryRepo::has_products(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "Cannot delete a category that has products".into(),
        )));
    }
    if CategoryRepo::delete(&state.pool, id).await? {
        tracing::info!(category_id = id, "Category deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
