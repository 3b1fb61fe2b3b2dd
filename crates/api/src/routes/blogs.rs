//! Route definitions for blogs and their images.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{blogs, images};
use crate::state::AppState;

/// Public routes mounted at `/blogs`.
///
/// ```text
/// GET /         -> list (published only)
/// GET /{slug}   -> show_by_slug (counts a view)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(blogs::list))
        .route("/{slug}", get(blogs::show_by_slug))
}

/// Admin routes mounted at `/admin/blogs`.
///
/// ```text
/// GET    /                          -> admin_list
/// POST   /                          -> create
/// GET    /statistics                -> statistics
/// GET    /{id}                      -> admin_show
/// PUT    /{id}                      -> update
/// DELETE /{id}                      -> delete (soft)
/// POST   /{id}/restore              -> restore
/// GET    /{id}/images               -> list_blog_images
/// POST   /{id}/images               -> upload_blog_image
/// POST   /{id}/images/multiple      -> upload_blog_images
/// PUT    /{id}/images/{image_id}    -> update_blog_image
/// DELETE /{id}/images/{image_id}    -> delete_blog_image
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(blogs::admin_list).post(blogs::create))
        .route("/statistics", get(blogs::statistics))
        .route(
            "/{id}",
            get(blogs::admin_show)
                .put(blogs::update)
                .delete(blogs::delete),
        )
        .route("/{id}/restore", post(blogs::restore))
        .route(
            "/{id}/images",
            get(images::list_blog_images).post(images::upload_blog_image),
        )
        .route("/{id}/images/multiple", post(images::upload_blog_images))
        .route(
            "/{id}/images/{image_id}",
            put(images::update_blog_image).delete(images::delete_blog_image),
        )
}
