//! Repository for the `product_images` and `blog_images` tables.
//!
//! Both tables are read into [`ImageRow`]: the parent key is aliased to
//! `parent_id`, product images select `caption` as `NULL` and blog images
//! select `is_primary` as `FALSE`.

use sqlx::PgPool;
use storefront_core::images::{ImageOwner, ImagePatch, NewImage, ParentRef};
use storefront_core::types::DbId;

use crate::models::image::ImageRow;

const PRODUCT_COLUMNS: &str = "id, product_id AS parent_id, path, filename, alt_text, \
                               NULL::TEXT AS caption, sort_order, is_primary, \
                               created_at, updated_at";

const BLOG_COLUMNS: &str = "id, blog_id AS parent_id, path, filename, alt_text, caption, \
                            sort_order, FALSE AS is_primary, created_at, updated_at";

/// Table, parent key column and select list for one owner.
struct ImageTable {
    table: &'static str,
    parent_col: &'static str,
    columns: &'static str,
}

fn table_of(owner: ImageOwner) -> ImageTable {
    match owner {
        ImageOwner::Product => ImageTable {
            table: "product_images",
            parent_col: "product_id",
            columns: PRODUCT_COLUMNS,
        },
        ImageOwner::Blog => ImageTable {
            table: "blog_images",
            parent_col: "blog_id",
            columns: BLOG_COLUMNS,
        },
    }
}

/// Provides ordered-collection storage for product and blog images.
pub struct ImageRepo;

impl ImageRepo {
    /// All images of a parent by ascending `sort_order`, then id.
    pub async fn list(pool: &PgPool, parent: ParentRef) -> Result<Vec<ImageRow>, sqlx::Error> {
        let t = table_of(parent.owner);
        let query = format!(
            "SELECT {} FROM {} WHERE {} = $1 ORDER BY sort_order ASC, id ASC",
            t.columns, t.table, t.parent_col
        );
        sqlx::query_as::<_, ImageRow>(&query)
            .bind(parent.id)
            .fetch_all(pool)
            .await
    }

    /// Find an image only if it belongs to `parent`.
    pub async fn find(
        pool: &PgPool,
        parent: ParentRef,
        image_id: DbId,
    ) -> Result<Option<ImageRow>, sqlx::Error> {
        let t = table_of(parent.owner);
        let query = format!(
            "SELECT {} FROM {} WHERE id = $1 AND {} = $2",
            t.columns, t.table, t.parent_col
        );
        sqlx::query_as::<_, ImageRow>(&query)
            .bind(image_id)
            .bind(parent.id)
            .fetch_optional(pool)
            .await
    }

    /// Highest `sort_order` of the parent's images, `None` when it has none.
    pub async fn max_sort_order(
        pool: &PgPool,
        parent: ParentRef,
    ) -> Result<Option<i32>, sqlx::Error> {
        let t = table_of(parent.owner);
        let query = format!(
            "SELECT MAX(sort_order) FROM {} WHERE {} = $1",
            t.table, t.parent_col
        );
        sqlx::query_scalar::<_, Option<i32>>(&query)
            .bind(parent.id)
            .fetch_one(pool)
            .await
    }

    /// Insert an image. A primary product image first clears the flag on
    /// its siblings, in the same transaction.
    pub async fn insert(
        pool: &PgPool,
        parent: ParentRef,
        image: &NewImage,
    ) -> Result<ImageRow, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let row = match parent.owner {
            ImageOwner::Product => {
                if image.is_primary {
                    sqlx::query(
                        "UPDATE product_images SET is_primary = FALSE
                         WHERE product_id = $1 AND is_primary",
                    )
                    .bind(parent.id)
                    .execute(&mut *tx)
                    .await?;
                }
                let query = format!(
                    "INSERT INTO product_images
                         (product_id, path, filename, alt_text, sort_order, is_primary)
                     VALUES ($1, $2, $3, $4, $5, $6)
                     RETURNING {PRODUCT_COLUMNS}"
                );
                sqlx::query_as::<_, ImageRow>(&query)
                    .bind(parent.id)
                    .bind(&image.path)
                    .bind(&image.filename)
                    .bind(&image.alt_text)
                    .bind(image.sort_order)
                    .bind(image.is_primary)
                    .fetch_one(&mut *tx)
                    .await?
            }
            ImageOwner::Blog => {
                let query = format!(
                    "INSERT INTO blog_images
                         (blog_id, path, filename, alt_text, caption, sort_order)
                     VALUES ($1, $2, $3, $4, $5, $6)
                     RETURNING {BLOG_COLUMNS}"
                );
                sqlx::query_as::<_, ImageRow>(&query)
                    .bind(parent.id)
                    .bind(&image.path)
                    .bind(&image.filename)
                    .bind(&image.alt_text)
                    .bind(&image.caption)
                    .bind(image.sort_order)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;
        Ok(row)
    }

    /// Clear the primary flag on every image of the parent. Returns the
    /// number of rows changed; always `0` for blogs.
    pub async fn clear_primary(pool: &PgPool, parent: ParentRef) -> Result<u64, sqlx::Error> {
        if !parent.owner.supports_primary() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE product_images SET is_primary = FALSE WHERE product_id = $1 AND is_primary",
        )
        .bind(parent.id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Patch an image of `parent`. Setting `is_primary = true` on a product
    /// image clears every other primary of the product in the same
    /// transaction. Returns `None` if the image is not the parent's.
    pub async fn update(
        pool: &PgPool,
        parent: ParentRef,
        image_id: DbId,
        patch: &ImagePatch,
    ) -> Result<Option<ImageRow>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let row = match parent.owner {
            ImageOwner::Product => {
                if patch.is_primary == Some(true) {
                    sqlx::query(
                        "UPDATE product_images SET is_primary = FALSE
                         WHERE product_id = $1 AND id <> $2 AND is_primary
                           AND EXISTS (SELECT 1 FROM product_images
                                       WHERE id = $2 AND product_id = $1)",
                    )
                    .bind(parent.id)
                    .bind(image_id)
                    .execute(&mut *tx)
                    .await?;
                }
                let query = format!(
                    "UPDATE product_images SET
                        alt_text = COALESCE($3, alt_text),
                        sort_order = COALESCE($4, sort_order),
                        is_primary = COALESCE($5, is_primary)
                     WHERE id = $1 AND product_id = $2
                     RETURNING {PRODUCT_COLUMNS}"
                );
                sqlx::query_as::<_, ImageRow>(&query)
                    .bind(image_id)
                    .bind(parent.id)
                    .bind(&patch.alt_text)
                    .bind(patch.sort_order)
                    .bind(patch.is_primary)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            ImageOwner::Blog => {
                let query = format!(
                    "UPDATE blog_images SET
                        alt_text = COALESCE($3, alt_text),
                        caption = COALESCE($4, caption),
                        sort_order = COALESCE($5, sort_order)
                     WHERE id = $1 AND blog_id = $2
                     RETURNING {BLOG_COLUMNS}"
                );
                sqlx::query_as::<_, ImageRow>(&query)
                    .bind(image_id)
                    .bind(parent.id)
                    .bind(&patch.alt_text)
                    .bind(&patch.caption)
                    .bind(patch.sort_order)
                    .fetch_optional(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;
        Ok(row)
    }

    /// Delete an image of `parent`. Returns `true` if a row was removed.
    pub async fn delete(
        pool: &PgPool,
        parent: ParentRef,
        image_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let t = table_of(parent.owner);
        let query = format!("DELETE FROM {} WHERE id = $1 AND {} = $2", t.table, t.parent_col);
        let result = sqlx::query(&query)
            .bind(image_id)
            .bind(parent.id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The primary image of each given product, where one exists.
    pub async fn primary_for_products(
        pool: &PgPool,
        product_ids: &[DbId],
    ) -> Result<Vec<ImageRow>, sqlx::Error> {
        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM product_images
             WHERE product_id = ANY($1) AND is_primary"
        );
        sqlx::query_as::<_, ImageRow>(&query)
            .bind(product_ids)
            .fetch_all(pool)
            .await
    }
}
