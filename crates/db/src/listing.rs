//! SQL generation for [`FilterSpec`] listings.
//!
//! Column names in `ORDER BY` come only from the kind's sort whitelist;
//! every caller-supplied value is a bind parameter.

use sqlx::{Postgres, QueryBuilder};
use storefront_core::listing::{like_pattern, FilterSpec, ListingKind};

/// Table backing a listing kind.
pub fn table_for(kind: ListingKind) -> &'static str {
    match kind {
        ListingKind::Products => "products",
        ListingKind::Blogs | ListingKind::PublishedBlogs => "blogs",
        ListingKind::Users => "users",
    }
}

/// `SELECT {columns} ... ORDER BY ... LIMIT ... OFFSET ...` for one page.
pub fn select_page(columns: &str, spec: &FilterSpec) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {columns} FROM {} WHERE TRUE",
        table_for(spec.kind)
    ));
    push_filters(&mut qb, spec);

    qb.push(format!(
        " ORDER BY {} {} NULLS LAST",
        spec.sort.field,
        spec.sort.direction.as_sql()
    ));
    if spec.sort.field != "id" {
        qb.push(", id ASC");
    }

    qb.push(" LIMIT ");
    qb.push_bind(spec.limit());
    qb.push(" OFFSET ");
    qb.push_bind(spec.offset());
    qb
}

/// `SELECT COUNT(*)` over the same filters as [`select_page`].
pub fn select_count(spec: &FilterSpec) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT COUNT(*) FROM {} WHERE TRUE",
        table_for(spec.kind)
    ));
    push_filters(&mut qb, spec);
    qb
}

/// Append the WHERE predicates in their fixed precedence order.
fn push_filters(qb: &mut QueryBuilder<'static, Postgres>, spec: &FilterSpec) {
    if spec.kind.soft_deletes() && !spec.with_trashed {
        qb.push(" AND deleted_at IS NULL");
    }

    if !spec.include_inactive || spec.kind == ListingKind::PublishedBlogs {
        match spec.kind {
            ListingKind::Products | ListingKind::Users => {
                qb.push(" AND is_active = TRUE");
            }
            ListingKind::Blogs | ListingKind::PublishedBlogs => {
                qb.push(
                    " AND is_published = TRUE AND published_at IS NOT NULL AND published_at <= NOW()",
                );
            }
        }
    }

    if let Some(term) = &spec.search {
        let pattern = like_pattern(term);
        qb.push(" AND (");
        for (i, field) in spec.kind.searchable_fields().iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(format!("{field} ILIKE "));
            qb.push_bind(pattern.clone());
        }
        qb.push(")");
    }

    if let Some(category_id) = spec.category_id {
        qb.push(" AND category_id = ");
        qb.push_bind(category_id);
    }

    if let Some(author_id) = spec.author_id {
        qb.push(" AND author_id = ");
        qb.push_bind(author_id);
    }

    if spec.featured_only {
        qb.push(" AND is_featured = TRUE");
    }

    if spec.in_stock_only {
        qb.push(" AND stock_quantity > 0");
    }

    if let Some(is_published) = spec.is_published {
        qb.push(" AND is_published = ");
        qb.push_bind(is_published);
    }
}
