//! Row models and request DTOs, one module per table.

pub mod blog;
pub mod category;
pub mod dashboard;
pub mod image;
pub mod product;
pub mod user;
