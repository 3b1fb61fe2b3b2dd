//! Slug derivation and light text sanitising for catalog/blog content.
//!
//! Slugs are not deduplicated here. Two titles that slugify to the same value
//! collide on the `uq_*_slug` constraint and surface as a conflict.

use std::sync::LazyLock;

use regex::Regex;

/// Anything that is not a separator, letter, digit or whitespace.
static DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\-\p{L}\p{N}\s]+").expect("valid regex"));

/// Runs of separators and whitespace.
static SEPARATOR_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\-\s]+").expect("valid regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Derive a URL-safe slug: lower-cased, punctuation removed, words joined by `-`.
///
/// Unicode letters and digits are kept as-is (lower-cased).
pub fn slugify(title: &str) -> String {
    let flipped = title.replace('_', "-").replace('@', "-at-").to_lowercase();
    let cleaned = DISALLOWED_RE.replace_all(&flipped, "");
    let joined = SEPARATOR_RUN_RE.replace_all(&cleaned, "-");
    joined.trim_matches('-').to_string()
}

/// Remove HTML tags, keeping the text content.
pub fn strip_tags(input: &str) -> String {
    TAG_RE.replace_all(input, "").trim().to_string()
}
