//! Request handlers, one module per resource.
//!
//! Handlers validate input, delegate to the repositories in `storefront_db`
//! (or the image collection manager in `storefront_core`) and map errors via
//! [`AppError`](crate::error::AppError).

pub mod auth;
pub mod blogs;
pub mod categories;
pub mod dashboard;
pub mod images;
pub mod products;
pub mod profile;
pub mod users;

use storefront_core::error::FieldErrors;
use storefront_core::slug::slugify;
use storefront_core::types::DbId;
use storefront_db::repositories::CategoryRepo;

/// Add a field error for `field`.
pub(crate) fn push_field_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

/// Derive a slug from `source`, recording an error on `field` when nothing
/// usable remains.
pub(crate) fn derive_slug(source: &str, field: &str, errors: &mut FieldErrors) -> String {
    let slug = slugify(source);
    if slug.is_empty() {
        push_field_error(
            errors,
            field,
            format!("The {field} must contain at least one letter or digit."),
        );
    }
    slug
}

/// Record an error on `field` when `category_id` names no category.
pub(crate) async fn check_category(
    pool: &sqlx::PgPool,
    field: &str,
    category_id: Option<DbId>,
    errors: &mut FieldErrors,
) -> Result<(), sqlx::Error> {
    if let Some(id) = category_id {
        if CategoryRepo::find_by_id(pool, id).await?.is_none() {
            push_field_error(errors, field, format!("The selected {field} is invalid."));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_slug_from_name() {
        let mut errors = FieldErrors::new();
        assert_eq!(derive_slug("Blue Mug", "name", &mut errors), "blue-mug");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_derive_slug_rejects_blank_and_symbol_only_names() {
        for source in ["   ", "", "!!!"] {
            let mut errors = FieldErrors::new();
            assert_eq!(derive_slug(source, "title", &mut errors), "");
            assert_eq!(errors["title"].len(), 1, "source {source:?}");
        }
    }
}
