//! Route definitions for products and their images.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{images, products};
use crate::state::AppState;

/// Public routes mounted at `/products`.
///
/// ```text
/// GET /       -> list (active only)
/// GET /{id}   -> show (active only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list))
        .route("/{id}", get(products::show))
}

/// Admin routes mounted at `/admin/products`.
///
/// ```text
/// GET    /                          -> admin_list
/// POST   /                          -> create
/// GET    /{id}                      -> admin_show
/// PUT    /{id}                      -> update
/// DELETE /{id}                      -> delete (soft)
/// POST   /{id}/restore              -> restore
/// GET    /{id}/images               -> list_product_images
/// POST   /{id}/images               -> upload_product_image
/// POST   /{id}/images/multiple      -> upload_product_images
/// PUT    /{id}/images/{image_id}    -> update_product_image
/// DELETE /{id}/images/{image_id}    -> delete_product_image
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(products::admin_list).post(products::create))
        .route(
            "/{id}",
            get(products::admin_show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/{id}/restore", post(products::restore))
        .route(
            "/{id}/images",
            get(images::list_product_images).post(images::upload_product_image),
        )
        .route(
            "/{id}/images/multiple",
            post(images::upload_product_images),
        )
        .route(
            "/{id}/images/{image_id}",
            put(images::update_product_image).delete(images::delete_product_image),
        )
}
