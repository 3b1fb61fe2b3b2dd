//! Filter, sort and pagination parameters for the paginated resource endpoints.
//!
//! Handlers deserialize the raw query string into [`RawListingParams`]
//! (every value an optional string) and turn it into a [`FilterSpec`] with
//! [`FilterSpec::from_raw`]. A `FilterSpec` is pure data; the persistence layer
//! translates it into SQL with a fixed filter precedence:
//!
//! 1. soft-deleted rows hidden (unless `with_trashed` on a privileged listing)
//! 2. visibility predicate (unless `include_inactive`)
//! 3. free-text search, OR-ed over the kind's searchable fields
//! 4. category / author exact match
//! 5. exact-match boolean filters
//! 6. sort (whitelisted field) with `id ASC` as tie-breaker
//! 7. `LIMIT` / `OFFSET` pagination
//!
//! Clients built on loosely typed front-ends send the literal string
//! `"undefined"` for unset values. Such values, like empty ones, are treated
//! as not supplied.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, FieldErrors};
use crate::types::DbId;

/// Placeholder value some clients send for unset parameters.
pub const UNDEFINED_SENTINEL: &str = "undefined";

/// Upper bound for a requested page size.
pub const MAX_PER_PAGE: i64 = 100;

// ---------------------------------------------------------------------------
// Raw parameters
// ---------------------------------------------------------------------------

/// Query-string parameters exactly as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawListingParams {
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub author_id: Option<String>,
    pub featured: Option<String>,
    pub in_stock: Option<String>,
    pub is_published: Option<String>,
    pub with_trashed: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub per_page: Option<String>,
    pub page: Option<String>,
}

/// Return the trimmed value if it counts as supplied.
pub fn supplied(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != UNDEFINED_SENTINEL)
}

/// Lenient boolean: `1`, `true`, `on`, `yes` (any case) are true, everything
/// else is false.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

/// Strict boolean for exact-match filters. Returns `None` for unrecognised
/// values.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// Build an `ILIKE` pattern matching `term` as a substring.
///
/// `%`, `_` and `\` in the term are escaped so they match literally.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

// ---------------------------------------------------------------------------
// Listing kinds
// ---------------------------------------------------------------------------

/// Which collection a listing runs against. Each kind carries its own
/// searchable fields, sort whitelist and defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    /// Products, public (active only) or admin.
    Products,
    /// Admin blog listing.
    Blogs,
    /// Public blog listing: published and with a publish date in the past.
    PublishedBlogs,
    /// Admin user listing.
    Users,
}

impl ListingKind {
    /// Text columns matched by the free-text search.
    pub fn searchable_fields(self) -> &'static [&'static str] {
        match self {
            ListingKind::Products => &["name", "description", "short_description"],
            ListingKind::Blogs | ListingKind::PublishedBlogs => &["title", "content", "excerpt"],
            ListingKind::Users => &["name", "email"],
        }
    }

    /// Columns a caller may sort by.
    pub fn sortable_fields(self) -> &'static [&'static str] {
        match self {
            ListingKind::Products => &[
                "id",
                "name",
                "sku",
                "price",
                "sale_price",
                "stock_quantity",
                "is_featured",
                "created_at",
                "updated_at",
            ],
            ListingKind::Blogs | ListingKind::PublishedBlogs => &[
                "id",
                "title",
                "views",
                "published_at",
                "created_at",
                "updated_at",
            ],
            ListingKind::Users => &["id", "name", "email", "created_at"],
        }
    }

    /// Sort applied when the caller supplies none.
    pub fn default_sort(self) -> SortSpec {
        match self {
            ListingKind::PublishedBlogs => SortSpec {
                field: "published_at",
                direction: SortDirection::Desc,
            },
            _ => SortSpec {
                field: "id",
                direction: SortDirection::Desc,
            },
        }
    }

    pub fn default_per_page(self) -> i64 {
        match self {
            ListingKind::Products | ListingKind::Blogs => 15,
            ListingKind::PublishedBlogs => 12,
            ListingKind::Users => 20,
        }
    }

    /// Whether rows of this kind carry a `deleted_at` column.
    pub fn soft_deletes(self) -> bool {
        !matches!(self, ListingKind::Users)
    }

    pub fn filters_by_category(self) -> bool {
        !matches!(self, ListingKind::Users)
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A whitelisted sort column plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: &'static str,
    pub direction: SortDirection,
}

// ---------------------------------------------------------------------------
// FilterSpec
// ---------------------------------------------------------------------------

/// Validated per-request listing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub kind: ListingKind,
    /// Privileged callers see inactive / unpublished rows.
    pub include_inactive: bool,
    /// Include soft-deleted rows. Only ever set for privileged callers.
    pub with_trashed: bool,
    pub search: Option<String>,
    pub category_id: Option<DbId>,
    pub author_id: Option<DbId>,
    /// Products: only featured rows when true.
    pub featured_only: bool,
    /// Products: only rows with `stock_quantity > 0` when true.
    pub in_stock_only: bool,
    /// Admin blogs: exact match on `is_published`.
    pub is_published: Option<bool>,
    pub sort: SortSpec,
    /// Always within `1..=MAX_PER_PAGE`.
    pub per_page: i64,
    /// 1-based, always at least 1.
    pub page: i64,
}

impl FilterSpec {
    /// A spec with no filters and the kind's defaults.
    pub fn for_kind(kind: ListingKind, include_inactive: bool) -> Self {
        Self {
            kind,
            include_inactive,
            with_trashed: false,
            search: None,
            category_id: None,
            author_id: None,
            featured_only: false,
            in_stock_only: false,
            is_published: None,
            sort: kind.default_sort(),
            per_page: kind.default_per_page(),
            page: 1,
        }
    }

    /// Validate raw query parameters into a spec.
    ///
    /// Parameters that do not apply to `kind` are ignored. Every invalid
    /// field is reported, not just the first.
    pub fn from_raw(
        kind: ListingKind,
        raw: &RawListingParams,
        include_inactive: bool,
    ) -> Result<Self, CoreError> {
        let mut spec = Self::for_kind(kind, include_inactive);
        let mut errors = FieldErrors::new();

        spec.search = supplied(&raw.search).map(str::to_string);

        if kind.filters_by_category() {
            spec.category_id = parse_id(&raw.category_id, "category_id", &mut errors);
        }

        match kind {
            ListingKind::Products => {
                spec.featured_only = supplied(&raw.featured).is_some_and(parse_flag);
                spec.in_stock_only = supplied(&raw.in_stock).is_some_and(parse_flag);
            }
            ListingKind::Blogs => {
                spec.author_id = parse_id(&raw.author_id, "author_id", &mut errors);
                if let Some(value) = supplied(&raw.is_published) {
                    match parse_bool(value) {
                        Some(flag) => spec.is_published = Some(flag),
                        None => push_error(
                            &mut errors,
                            "is_published",
                            "The is_published field must be true or false.",
                        ),
                    }
                }
            }
            ListingKind::PublishedBlogs | ListingKind::Users => {}
        }

        if include_inactive && kind.soft_deletes() {
            spec.with_trashed = supplied(&raw.with_trashed).is_some_and(parse_flag);
        }

        if let Some(field) = supplied(&raw.sort_by) {
            match kind.sortable_fields().iter().find(|f| **f == field) {
                Some(known) => spec.sort.field = *known,
                None => push_error(
                    &mut errors,
                    "sort_by",
                    format!(
                        "The selected sort_by is invalid. Allowed: {}",
                        kind.sortable_fields().join(", ")
                    ),
                ),
            }
        }

        if let Some(order) = supplied(&raw.sort_order) {
            match SortDirection::parse(order) {
                Some(direction) => spec.sort.direction = direction,
                None => push_error(
                    &mut errors,
                    "sort_order",
                    "The sort_order must be either asc or desc.",
                ),
            }
        }

        if let Some(per_page) = parse_int(&raw.per_page, "per_page", &mut errors) {
            spec.per_page = clamp_per_page(per_page);
        }

        if let Some(page) = parse_int(&raw.page, "page", &mut errors) {
            spec.page = page.max(1);
        }

        if errors.is_empty() {
            Ok(spec)
        } else {
            Err(CoreError::InvalidFields(errors))
        }
    }

    /// Restrict to one category, overriding whatever the caller asked for.
    pub fn with_category(mut self, category_id: DbId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Rows skipped before the current page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

/// Clamp a requested page size to `1..=MAX_PER_PAGE`.
pub fn clamp_per_page(per_page: i64) -> i64 {
    per_page.clamp(1, MAX_PER_PAGE)
}

fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

fn parse_int(value: &Option<String>, field: &str, errors: &mut FieldErrors) -> Option<i64> {
    let raw = supplied(value)?;
    match raw.parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => {
            push_error(errors, field, format!("The {field} must be an integer."));
            None
        }
    }
}

fn parse_id(value: &Option<String>, field: &str, errors: &mut FieldErrors) -> Option<DbId> {
    parse_int(value, field, errors)
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// Pagination metadata returned alongside a page of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// One page of a listing: `{ "data": [...], "meta": {...} }`.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, spec: &FilterSpec, total: i64) -> Self {
        Self {
            data,
            meta: PageMeta {
                page: spec.page,
                per_page: spec.per_page,
                total,
                total_pages: total_pages(total, spec.per_page),
            },
        }
    }

    /// Transform the rows, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

/// `ceil(total / per_page)`; zero when there are no rows.
pub fn total_pages(total: i64, per_page: i64) -> i64 {
    if per_page <= 0 || total <= 0 {
        return 0;
    }
    (total + per_page - 1) / per_page
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
