//! Handlers for the image collections under `/admin/products/{id}/images`
//! and `/admin/blogs/{id}/images`.
//!
//! Both resources share the same operations; the wrappers only pick the
//! parent kind.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use storefront_core::images::{BatchUploadReport, ImagePatch, OrderedImage, ParentRef};
use storefront_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::multipart::{read_batch, read_single};
use crate::response::DataResponse;
use crate::state::AppState;

/// Response body for a batch upload.
#[derive(Debug, Serialize)]
pub struct BatchUploadResponse {
    pub message: String,
    pub data: BatchUploadReport,
}

// ---------------------------------------------------------------------------
// Shared implementations
// ---------------------------------------------------------------------------

async fn list_images(
    state: &AppState,
    parent: ParentRef,
) -> AppResult<Json<DataResponse<Vec<OrderedImage>>>> {
    let images = state.image_collection().list(parent).await?;
    Ok(Json(DataResponse { data: images }))
}

async fn upload_image(
    state: &AppState,
    parent: ParentRef,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<OrderedImage>>)> {
    let form = read_single(multipart).await?;
    let image = state
        .image_collection()
        .append_one(parent, form.upload, form.meta)
        .await?;
    tracing::info!(
        parent_id = parent.id,
        image_id = image.id,
        sort_order = image.sort_order,
        is_primary = image.is_primary,
        "Image uploaded"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: image })))
}

/// 201 when every file was stored, 206 when some failed.
async fn upload_images(
    state: &AppState,
    parent: ParentRef,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<BatchUploadResponse>)> {
    let form = read_batch(multipart).await?;
    let report = state
        .image_collection()
        .append_many(parent, form.uploads, form.metas, form.set_first_as_primary)
        .await?;

    tracing::info!(
        parent_id = parent.id,
        success_count = report.success_count,
        error_count = report.error_count,
        "Batch image upload finished"
    );

    let (status, message) = if report.is_partial() {
        (
            StatusCode::PARTIAL_CONTENT,
            format!(
                "{} image(s) uploaded, {} failed",
                report.success_count, report.error_count
            ),
        )
    } else {
        (
            StatusCode::CREATED,
            format!("{} image(s) uploaded successfully", report.success_count),
        )
    };
    Ok((
        status,
        Json(BatchUploadResponse {
            message,
            data: report,
        }),
    ))
}

async fn update_image(
    state: &AppState,
    parent: ParentRef,
    image_id: DbId,
    patch: ImagePatch,
) -> AppResult<Json<DataResponse<OrderedImage>>> {
    let image = state
        .image_collection()
        .update(parent, image_id, patch)
        .await?;
    tracing::info!(parent_id = parent.id, image_id, "Image updated");
    Ok(Json(DataResponse { data: image }))
}

async fn delete_image(state: &AppState, parent: ParentRef, image_id: DbId) -> AppResult<StatusCode> {
    state.image_collection().delete(parent, image_id).await?;
    tracing::info!(parent_id = parent.id, image_id, "Image deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Product images
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/products/{id}/images
pub async fn list_product_images(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(product_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<OrderedImage>>>> {
    list_images(&state, ParentRef::product(product_id)).await
}

/// POST /api/v1/admin/products/{id}/images
pub async fn upload_product_image(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(product_id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<OrderedImage>>)> {
    upload_image(&state, ParentRef::product(product_id), multipart).await
}

/// POST /api/v1/admin/products/{id}/images/multiple
pub async fn upload_product_images(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(product_id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<BatchUploadResponse>)> {
    upload_images(&state, ParentRef::product(product_id), multipart).await
}

/// PUT /api/v1/admin/products/{id}/images/{image_id}
pub async fn update_product_image(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((product_id, image_id)): Path<(DbId, DbId)>,
    Json(patch): Json<ImagePatch>,
) -> AppResult<Json<DataResponse<OrderedImage>>> {
    update_image(&state, ParentRef::product(product_id), image_id, patch).await
}

/// DELETE /api/v1/admin/products/{id}/images/{image_id}
pub async fn delete_product_image(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((product_id, image_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    delete_image(&state, ParentRef::product(product_id), image_id).await
}

// ---------------------------------------------------------------------------
// Blog images
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/blogs/{id}/images
pub async fn list_blog_images(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(blog_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<OrderedImage>>>> {
    list_images(&state, ParentRef::blog(blog_id)).await
}

/// POST /api/v1/admin/blogs/{id}/images
pub async fn upload_blog_image(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(blog_id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<OrderedImage>>)> {
    upload_image(&state, ParentRef::blog(blog_id), multipart).await
}

/// POST /api/v1/admin/blogs/{id}/images/multiple
pub async fn upload_blog_images(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(blog_id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<BatchUploadResponse>)> {
    upload_images(&state, ParentRef::blog(blog_id), multipart).await
}

/// PUT /api/v1/admin/blogs/{id}/images/{image_id}
pub async fn update_blog_image(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((blog_id, image_id)): Path<(DbId, DbId)>,
    Json(patch): Json<ImagePatch>,
) -> AppResult<Json<DataResponse<OrderedImage>>> {
    update_image(&state, ParentRef::blog(blog_id), image_id, patch).await
}

/// DELETE /api/v1/admin/blogs/{id}/images/{image_id}
pub async fn delete_blog_image(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((blog_id, image_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    delete_image(&state, ParentRef::blog(blog_id), image_id).await
}
