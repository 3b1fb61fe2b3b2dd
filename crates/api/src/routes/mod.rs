pub mod admin;
pub mod auth;
pub mod blogs;
pub mod categories;
pub mod health;
pub mod products;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                  login (public)
/// /auth/logout                                 logout (requires auth)
/// /auth/me                                     current user (requires auth)
///
/// /user/profile                                update profile (requires auth)
/// /user/password                               change password (requires auth)
///
/// /products                                    list (public)
/// /products/{id}                               show (public)
/// /categories                                  list with children (public)
/// /categories/{id}/products                    category products (public)
/// /blogs                                       list published (public)
/// /blogs/{slug}                                show + view count (public)
///
/// /admin/dashboard/stats                       summary (admin only)
/// /admin/users                                 list (admin only)
/// /admin/users/{id}/status                     activate / deactivate
///
/// /admin/products                              list, create
/// /admin/products/{id}                         get, update, delete
/// /admin/products/{id}/restore                 restore (POST)
/// /admin/products/{id}/images                  list, upload one
/// /admin/products/{id}/images/multiple         upload batch (POST)
/// /admin/products/{id}/images/{image_id}       update, delete
///
/// /admin/blogs                                 list, create
/// /admin/blogs/statistics                      counts and top lists
/// /admin/blogs/{id}                            get, update, delete
/// /admin/blogs/{id}/restore                    restore (POST)
/// /admin/blogs/{id}/images                     list, upload one
/// /admin/blogs/{id}/images/multiple            upload batch (POST)
/// /admin/blogs/{id}/images/{image_id}          update, delete
///
/// /admin/categories                            create
/// /admin/categories/{id}                       update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication and the caller's own account.
        .nest("/auth", auth::router())
        .nest("/user", user::router())
        // Storefront (public).
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/blogs", blogs::router())
        // Admin.
        .nest("/admin", admin::router())
        .nest("/admin/products", products::admin_router())
        .nest("/admin/blogs", blogs::admin_router())
        .nest("/admin/categories", categories::admin_router())
}
