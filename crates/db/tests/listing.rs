//! Integration tests for paginated listings against a real database.

use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::PgPool;
use storefront_core::listing::{FilterSpec, ListingKind, Page, RawListingParams};
use storefront_db::models::blog::CreateBlog;
use storefront_db::models::product::CreateProduct;
use storefront_db::models::user::CreateUser;
use storefront_db::repositories::{BlogRepo, ProductRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_product(name: &str, sku: &str, stock: i32, active: bool) -> CreateProduct {
    CreateProduct {
        name: name.to_string(),
        description: Some(format!("{name} description")),
        short_description: None,
        sku: sku.to_string(),
        price: Decimal::from_str("10.00").unwrap(),
        sale_price: None,
        stock_quantity: Some(stock),
        min_stock_level: None,
        weight: None,
        dimensions: None,
        brand: None,
        tags: None,
        is_featured: None,
        is_active: Some(active),
        meta_title: None,
        meta_description: None,
        category_id: None,
    }
}

fn new_blog(title: &str, published: bool) -> CreateBlog {
    CreateBlog {
        title: title.to_string(),
        excerpt: None,
        content: format!("{title} body"),
        category_id: None,
        featured_image: None,
        meta_title: None,
        meta_description: None,
        meta_keywords: None,
        is_published: Some(published),
        published_at: None,
        product_ids: None,
    }
}

async fn agent(pool: &PgPool) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            name: "Agent".to_string(),
            email: "agent@example.com".to_string(),
            password_hash: "x".to_string(),
            phone: None,
            is_admin: true,
        },
    )
    .await
    .unwrap()
    .id
}

fn spec(kind: ListingKind, include_inactive: bool, raw: RawListingParams) -> FilterSpec {
    FilterSpec::from_raw(kind, &raw, include_inactive).unwrap()
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_public_listing_hides_inactive_and_deleted(pool: PgPool) {
    let agent_id = agent(&pool).await;
    let visible = ProductRepo::create(&pool, "lamp", agent_id, &new_product("Lamp", "L-1", 3, true))
        .await
        .unwrap();
    ProductRepo::create(&pool, "chair", agent_id, &new_product("Chair", "C-1", 3, false))
        .await
        .unwrap();
    let trashed = ProductRepo::create(&pool, "desk", agent_id, &new_product("Desk", "D-1", 3, true))
        .await
        .unwrap();
    assert!(ProductRepo::soft_delete(&pool, trashed.id).await.unwrap());

    let public = spec(ListingKind::Products, false, RawListingParams::default());
    let (rows, total) = ProductRepo::list(&pool, &public).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].id, visible.id);

    let admin = spec(ListingKind::Products, true, RawListingParams::default());
    let (_, total) = ProductRepo::list(&pool, &admin).await.unwrap();
    assert_eq!(total, 2);

    let trashed_too = spec(
        ListingKind::Products,
        true,
        RawListingParams {
            with_trashed: Some("true".into()),
            ..RawListingParams::default()
        },
    );
    let (_, total) = ProductRepo::list(&pool, &trashed_too).await.unwrap();
    assert_eq!(total, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_search_treats_wildcards_literally(pool: PgPool) {
    let agent_id = agent(&pool).await;
    ProductRepo::create(&pool, "100-cotton", agent_id, &new_product("100% Cotton", "T-1", 1, true))
        .await
        .unwrap();
    ProductRepo::create(&pool, "1000-thread", agent_id, &new_product("1000 Thread", "T-2", 1, true))
        .await
        .unwrap();

    let spec = spec(
        ListingKind::Products,
        false,
        RawListingParams {
            search: Some("100%".into()),
            ..RawListingParams::default()
        },
    );
    let (rows, total) = ProductRepo::list(&pool, &spec).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].name, "100% Cotton");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pagination_meta_and_stock_filter(pool: PgPool) {
    let agent_id = agent(&pool).await;
    for i in 0..5 {
        let stock = if i % 2 == 0 { 0 } else { 4 };
        ProductRepo::create(
            &pool,
            &format!("item-{i}"),
            agent_id,
            &new_product(&format!("Item {i}"), &format!("I-{i}"), stock, true),
        )
        .await
        .unwrap();
    }

    let paged = spec(
        ListingKind::Products,
        false,
        RawListingParams {
            per_page: Some("2".into()),
            page: Some("3".into()),
            sort_by: Some("name".into()),
            sort_order: Some("asc".into()),
            ..RawListingParams::default()
        },
    );
    let (rows, total) = ProductRepo::list(&pool, &paged).await.unwrap();
    let page = Page::new(rows, &paged, total);
    assert_eq!(page.meta.total, 5);
    assert_eq!(page.meta.total_pages, 3);
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].name, "Item 4");

    let in_stock = spec(
        ListingKind::Products,
        false,
        RawListingParams {
            in_stock: Some("1".into()),
            ..RawListingParams::default()
        },
    );
    let (_, total) = ProductRepo::list(&pool, &in_stock).await.unwrap();
    assert_eq!(total, 2);
}

// ---------------------------------------------------------------------------
// Blogs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_published_listing_excludes_drafts_and_future_posts(pool: PgPool) {
    let author_id = agent(&pool).await;
    let live = BlogRepo::create(&pool, "live", author_id, &new_blog("Live", true))
        .await
        .unwrap();
    BlogRepo::create(&pool, "draft", author_id, &new_blog("Draft", false))
        .await
        .unwrap();
    let mut scheduled = new_blog("Scheduled", true);
    scheduled.published_at = Some(chrono::Utc::now() + chrono::Duration::days(3));
    BlogRepo::create(&pool, "scheduled", author_id, &scheduled)
        .await
        .unwrap();

    let public = spec(ListingKind::PublishedBlogs, false, RawListingParams::default());
    let (rows, total) = BlogRepo::list(&pool, &public).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].id, live.id);

    let admin = spec(ListingKind::Blogs, true, RawListingParams::default());
    let (rows, total) = BlogRepo::list(&pool, &admin).await.unwrap();
    assert_eq!(total, 3);
    // Admin default sort is newest id first.
    assert_eq!(rows[2].id, live.id);

    assert!(BlogRepo::find_published_by_slug(&pool, "scheduled")
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_public_and_admin_blog_listings_sort_differently(pool: PgPool) {
    let author_id = agent(&pool).await;
    let now = chrono::Utc::now();

    // Created first, published most recently.
    let mut recent = new_blog("Recent", true);
    recent.published_at = Some(now - chrono::Duration::hours(1));
    let recent = BlogRepo::create(&pool, "recent", author_id, &recent)
        .await
        .unwrap();

    // Created second, backdated.
    let mut backdated = new_blog("Backdated", true);
    backdated.published_at = Some(now - chrono::Duration::days(10));
    let backdated = BlogRepo::create(&pool, "backdated", author_id, &backdated)
        .await
        .unwrap();
    assert!(backdated.id > recent.id);

    let public = spec(ListingKind::PublishedBlogs, false, RawListingParams::default());
    let (rows, _) = BlogRepo::list(&pool, &public).await.unwrap();
    let ids: Vec<i64> = rows.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![recent.id, backdated.id]);

    let admin = spec(ListingKind::Blogs, true, RawListingParams::default());
    let (rows, _) = BlogRepo::list(&pool, &admin).await.unwrap();
    let ids: Vec<i64> = rows.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![backdated.id, recent.id]);
}
