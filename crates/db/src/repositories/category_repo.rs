//! Repository for the `categories` table.

use sqlx::PgPool;
use storefront_core::types::DbId;

use crate::models::category::{Category, CreateCategory, UpdateCategory};

const COLUMNS: &str = "id, name, slug, description, image, parent_id, sort_order, is_active, \
                       created_at, updated_at";

/// Provides CRUD operations for categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// Insert a new category with a precomputed slug.
    pub async fn create(
        pool: &PgPool,
        slug: &str,
        input: &CreateCategory,
    ) -> Result<Category, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories (name, slug, description, image, parent_id, sort_order, is_active)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 0), COALESCE($7, TRUE))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(&input.name)
            .bind(slug)
            .bind(&input.description)
            .bind(&input.image)
            .bind(input.parent_id)
            .bind(input.sort_order)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a category by id only if it is active.
    pub async fn find_active_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1 AND is_active = TRUE");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active categories ordered by `sort_order, name`. With `parent_only`,
    /// only top-level categories are returned.
    pub async fn list_active(
        pool: &PgPool,
        parent_only: bool,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM categories
             WHERE is_active = TRUE AND ($1 = FALSE OR parent_id IS NULL)
             ORDER BY sort_order, name, id"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(parent_only)
            .fetch_all(pool)
            .await
    }

    /// Active direct children of any of `parent_ids`.
    pub async fn list_active_children(
        pool: &PgPool,
        parent_ids: &[DbId],
    ) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM categories
             WHERE is_active = TRUE AND parent_id = ANY($1)
             ORDER BY sort_order, name, id"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(parent_ids)
            .fetch_all(pool)
            .await
    }

    /// Update a category. `slug` is supplied when the name changed.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        slug: Option<&str>,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!(
            "UPDATE categories SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                image = COALESCE($5, image),
                parent_id = COALESCE($6, parent_id),
                sort_order = COALESCE($7, sort_order),
                is_active = COALESCE($8, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(slug)
            .bind(&input.description)
            .bind(&input.image)
            .bind(input.parent_id)
            .bind(input.sort_order)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a category. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether any product, trashed or not, references the category.
    pub async fn has_products(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE category_id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}
