//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod blog_repo;
pub mod category_repo;
pub mod dashboard_repo;
pub mod image_repo;
pub mod product_repo;
pub mod user_repo;

pub use blog_repo::BlogRepo;
pub use category_repo::CategoryRepo;
pub use dashboard_repo::DashboardRepo;
pub use image_repo::ImageRepo;
pub use product_repo::ProductRepo;
pub use user_repo::UserRepo;
