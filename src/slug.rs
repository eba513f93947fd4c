//! URL slugs for journal entries.
//!
//! A slug is derived from the entry title and must be unique across all
//! entries. Collisions are resolved by appending `-1`, `-2`, ... to the base
//! slug until a free candidate is found.

use sqlx::SqliteConnection;

/// Slug used when a title contains nothing slug-worthy, e.g. `"!!!"`.
pub const FALLBACK_SLUG: &str = "entry";

/// Lowercase, hyphen-separated ASCII form of `title`.
///
/// Apostrophes are dropped so "Don't panic" reads `dont-panic`; every other
/// run of non-alphanumeric characters collapses into one hyphen.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '\'' || c == '\u{2019}' {
            continue;
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Path segments under `/entries/` that other routes already claim.
const RESERVED: &[&str] = &["new", "tag"];

/// Whether `slug` would be shadowed by a fixed route or read as an entry id.
pub fn is_reserved(slug: &str) -> bool {
    RESERVED.contains(&slug) || slug.bytes().all(|b| b.is_ascii_digit())
}

/// The `n`th collision candidate for `base`; `0` is the base itself.
pub fn candidate(base: &str, n: u32) -> String {
    if n == 0 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}

async fn slug_taken(
    conn: &mut SqliteConnection,
    slug: &str,
    exclude: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM entries WHERE slug = ? AND (? IS NULL OR id != ?)",
    )
    .bind(slug)
    .bind(exclude)
    .bind(exclude)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count > 0)
}

/// Resolve a slug for `title` that no stored entry uses.
///
/// `exclude` is the id of the entry being edited; its current slug does not
/// count as a collision. Reserved bases start at `-1`. Call this inside the transaction that writes the
/// entry so the check and the write see the same rows.
pub async fn unique_slug(
    conn: &mut SqliteConnection,
    title: &str,
    exclude: Option<i64>,
) -> Result<String, sqlx::Error> {
    let base = slugify(title);
    let mut n = u32::from(is_reserved(&base));
    loop {
        let slug = candidate(&base, n);
        if !slug_taken(conn, &slug, exclude).await? {
            return Ok(slug);
        }
        n += 1;
    }
}
