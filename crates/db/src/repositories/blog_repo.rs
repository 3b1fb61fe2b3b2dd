//! Repository for the `blogs` table and its `blog_product` attachments.

use sqlx::{PgPool, Postgres, Transaction};
use storefront_core::listing::FilterSpec;
use storefront_core::types::DbId;

use crate::listing::{select_count, select_page};
use crate::models::blog::{Blog, BlogCounts, BlogSummary, CreateBlog, UpdateBlog};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, slug, excerpt, content, category_id, author_id, \
                       featured_image, meta_title, meta_description, meta_keywords, views, \
                       is_published, published_at, deleted_at, created_at, updated_at";

const SUMMARY_COLUMNS: &str = "id, title, slug, views, is_published, published_at, created_at";

/// Storefront visibility: published with a publish date that has passed.
const VISIBLE: &str =
    "deleted_at IS NULL AND is_published = TRUE AND published_at IS NOT NULL AND published_at <= NOW()";

/// Provides CRUD, soft-delete, view counting and statistics for blogs.
pub struct BlogRepo;

impl BlogRepo {
    /// Insert a blog and its product attachments in one transaction.
    ///
    /// A published blog without an explicit `published_at` is stamped with
    /// the current time.
    pub async fn create(
        pool: &PgPool,
        slug: &str,
        author_id: DbId,
        input: &CreateBlog,
    ) -> Result<Blog, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO blogs (title, slug, excerpt, content, category_id, author_id,
                 featured_image, meta_title, meta_description, meta_keywords, is_published,
                 published_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, COALESCE($11, FALSE),
                 CASE WHEN $12::TIMESTAMPTZ IS NOT NULL THEN $12
                      WHEN COALESCE($11, FALSE) THEN NOW()
                      ELSE NULL END)
             RETURNING {COLUMNS}"
        );
        let blog = sqlx::query_as::<_, Blog>(&query)
            .bind(&input.title)
            .bind(slug)
            .bind(&input.excerpt)
            .bind(&input.content)
            .bind(input.category_id)
            .bind(author_id)
            .bind(&input.featured_image)
            .bind(&input.meta_title)
            .bind(&input.meta_description)
            .bind(&input.meta_keywords)
            .bind(input.is_published)
            .bind(input.published_at)
            .fetch_one(&mut *tx)
            .await?;

        if let Some(product_ids) = &input.product_ids {
            attach_products(&mut tx, blog.id, product_ids).await?;
        }

        tx.commit().await?;
        Ok(blog)
    }

    /// Find a non-deleted blog by id, published or not.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Blog>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM blogs WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Blog>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a blog by slug only if it is visible on the storefront.
    pub async fn find_published_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<Blog>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM blogs WHERE slug = $1 AND {VISIBLE}");
        sqlx::query_as::<_, Blog>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// One page of blogs matching `spec`, plus the total match count.
    pub async fn list(pool: &PgPool, spec: &FilterSpec) -> Result<(Vec<Blog>, i64), sqlx::Error> {
        let blogs = select_page(COLUMNS, spec)
            .build_query_as::<Blog>()
            .fetch_all(pool)
            .await?;
        let total: i64 = select_count(spec)
            .build_query_scalar()
            .fetch_one(pool)
            .await?;
        Ok((blogs, total))
    }

    /// Update a non-deleted blog. Only non-`None` fields are applied and a
    /// supplied `product_ids` replaces the attachments.
    ///
    /// Publishing a blog that has never had a publish date stamps it with
    /// the current time.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        slug: Option<&str>,
        input: &UpdateBlog,
    ) -> Result<Option<Blog>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE blogs SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                excerpt = COALESCE($4, excerpt),
                content = COALESCE($5, content),
                category_id = COALESCE($6, category_id),
                featured_image = COALESCE($7, featured_image),
                meta_title = COALESCE($8, meta_title),
                meta_description = COALESCE($9, meta_description),
                meta_keywords = COALESCE($10, meta_keywords),
                is_published = COALESCE($11, is_published),
                published_at = CASE
                    WHEN $12::TIMESTAMPTZ IS NOT NULL THEN $12
                    WHEN COALESCE($11, is_published) AND published_at IS NULL THEN NOW()
                    ELSE published_at END
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        let blog = sqlx::query_as::<_, Blog>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(slug)
            .bind(&input.excerpt)
            .bind(&input.content)
            .bind(input.category_id)
            .bind(&input.featured_image)
            .bind(&input.meta_title)
            .bind(&input.meta_description)
            .bind(&input.meta_keywords)
            .bind(input.is_published)
            .bind(input.published_at)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(blog) = blog else {
            return Ok(None);
        };

        if let Some(product_ids) = &input.product_ids {
            sqlx::query("DELETE FROM blog_product WHERE blog_id = $1")
                .bind(blog.id)
                .execute(&mut *tx)
                .await?;
            attach_products(&mut tx, blog.id, product_ids).await?;
        }

        tx.commit().await?;
        Ok(Some(blog))
    }

    /// Soft-delete a blog. Returns `true` if the row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE blogs SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Restore a soft-deleted blog. Returns `true` if the row was restored.
    pub async fn restore(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE blogs SET deleted_at = NULL WHERE id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether a non-deleted blog with this id exists.
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM blogs WHERE id = $1 AND deleted_at IS NULL)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Add one to the view counter.
    pub async fn increment_views(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE blogs SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Totals over non-deleted blogs.
    pub async fn counts(pool: &PgPool) -> Result<BlogCounts, sqlx::Error> {
        sqlx::query_as::<_, BlogCounts>(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE is_published) AS published,
                COUNT(*) FILTER (WHERE NOT is_published) AS draft,
                COALESCE(SUM(views), 0)::BIGINT AS total_views
             FROM blogs
             WHERE deleted_at IS NULL",
        )
        .fetch_one(pool)
        .await
    }

    /// Most viewed storefront-visible blogs.
    pub async fn most_viewed(pool: &PgPool, limit: i64) -> Result<Vec<BlogSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM blogs WHERE {VISIBLE}
             ORDER BY views DESC, id ASC LIMIT $1"
        );
        sqlx::query_as::<_, BlogSummary>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Most recently created blogs, published or not.
    pub async fn most_recent(pool: &PgPool, limit: i64) -> Result<Vec<BlogSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM blogs WHERE deleted_at IS NULL
             ORDER BY created_at DESC, id DESC LIMIT $1"
        );
        sqlx::query_as::<_, BlogSummary>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}

/// Link `product_ids` to a blog, using each id's position as its sort order.
/// Duplicate ids keep their first position.
async fn attach_products(
    tx: &mut Transaction<'_, Postgres>,
    blog_id: DbId,
    product_ids: &[DbId],
) -> Result<(), sqlx::Error> {
    if product_ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        "INSERT INTO blog_product (blog_id, product_id, sort_order)
         SELECT $1, pid, (ord - 1)::INTEGER
         FROM UNNEST($2::BIGINT[]) WITH ORDINALITY AS t(pid, ord)
         ORDER BY ord
         ON CONFLICT (blog_id, product_id) DO NOTHING",
    )
    .bind(blog_id)
    .bind(product_ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
