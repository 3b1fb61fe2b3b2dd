//! Repository for the `products` table.

use sqlx::types::Json;
use sqlx::PgPool;
use storefront_core::listing::FilterSpec;
use storefront_core::types::DbId;

use crate::listing::{select_count, select_page};
use crate::models::product::{CreateProduct, Product, UpdateProduct};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str =
    "id, name, slug, description, short_description, sku, price, sale_price, \
     stock_quantity, min_stock_level, weight, dimensions, brand, tags, is_featured, is_active, \
     meta_title, meta_description, category_id, agent_id, deleted_at, created_at, updated_at";

/// Provides CRUD and soft-delete operations for products.
pub struct ProductRepo;

impl ProductRepo {
    /// Insert a new product. `slug` is derived from the name and
    /// `short_description` is expected to be tag-free already.
    pub async fn create(
        pool: &PgPool,
        slug: &str,
        agent_id: DbId,
        input: &CreateProduct,
    ) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products (name, slug, description, short_description, sku, price,
                 sale_price, stock_quantity, min_stock_level, weight, dimensions, brand, tags,
                 is_featured, is_active, meta_title, meta_description, category_id, agent_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, 0), COALESCE($9, 0), $10, $11,
                 $12, $13, COALESCE($14, FALSE), COALESCE($15, TRUE), $16, $17, $18, $19)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&input.name)
            .bind(slug)
            .bind(&input.description)
            .bind(&input.short_description)
            .bind(&input.sku)
            .bind(input.price)
            .bind(input.sale_price)
            .bind(input.stock_quantity)
            .bind(input.min_stock_level)
            .bind(input.weight)
            .bind(&input.dimensions)
            .bind(&input.brand)
            .bind(input.tags.as_ref().map(Json))
            .bind(input.is_featured)
            .bind(input.is_active)
            .bind(&input.meta_title)
            .bind(&input.meta_description)
            .bind(input.category_id)
            .bind(agent_id)
            .fetch_one(pool)
            .await
    }

    /// Find a non-deleted product by id, whatever its active flag.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a product visible on the storefront (active and not deleted).
    pub async fn find_active_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products
             WHERE id = $1 AND deleted_at IS NULL AND is_active = TRUE"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Non-deleted products with the given ids, in no particular order.
    pub async fn list_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products WHERE id = ANY($1) AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Non-deleted products attached to a blog, in attachment order.
    pub async fn list_for_blog(pool: &PgPool, blog_id: DbId) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products
             JOIN (SELECT product_id, sort_order AS link_order
                   FROM blog_product WHERE blog_id = $1) bp ON bp.product_id = products.id
             WHERE deleted_at IS NULL
             ORDER BY link_order, id"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(blog_id)
            .fetch_all(pool)
            .await
    }

    /// One page of products matching `spec`, plus the total match count.
    pub async fn list(
        pool: &PgPool,
        spec: &FilterSpec,
    ) -> Result<(Vec<Product>, i64), sqlx::Error> {
        let products = select_page(COLUMNS, spec)
            .build_query_as::<Product>()
            .fetch_all(pool)
            .await?;
        let total: i64 = select_count(spec)
            .build_query_scalar()
            .fetch_one(pool)
            .await?;
        Ok((products, total))
    }

    /// Update a non-deleted product. Only non-`None` fields are applied;
    /// `slug` is supplied when the name changed.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        slug: Option<&str>,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "UPDATE products SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                short_description = COALESCE($5, short_description),
                sku = COALESCE($6, sku),
                price = COALESCE($7, price),
                sale_price = COALESCE($8, sale_price),
                stock_quantity = COALESCE($9, stock_quantity),
                min_stock_level = COALESCE($10, min_stock_level),
                weight = COALESCE($11, weight),
                dimensions = COALESCE($12, dimensions),
                brand = COALESCE($13, brand),
                tags = COALESCE($14, tags),
                is_featured = COALESCE($15, is_featured),
                is_active = COALESCE($16, is_active),
                meta_title = COALESCE($17, meta_title),
                meta_description = COALESCE($18, meta_description),
                category_id = COALESCE($19, category_id)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(slug)
            .bind(&input.description)
            .bind(&input.short_description)
            .bind(&input.sku)
            .bind(input.price)
            .bind(input.sale_price)
            .bind(input.stock_quantity)
            .bind(input.min_stock_level)
            .bind(input.weight)
            .bind(&input.dimensions)
            .bind(&input.brand)
            .bind(input.tags.as_ref().map(Json))
            .bind(input.is_featured)
            .bind(input.is_active)
            .bind(&input.meta_title)
            .bind(&input.meta_description)
            .bind(input.category_id)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a product. Returns `true` if the row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE products SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Restore a soft-deleted product. Returns `true` if the row was restored.
    pub async fn restore(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE products SET deleted_at = NULL WHERE id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether a non-deleted product with this id exists.
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }
}
