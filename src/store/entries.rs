use std::collections::BTreeSet;

use chrono::NaiveDate;
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use super::{is_unique_violation, tags, StoreError};
use crate::models::{Entry, EntrySummary};
use crate::slug::unique_slug;

/// Field values for creating or editing an entry.
#[derive(Debug, Clone)]
pub struct EntryInput {
    pub title: String,
    pub date: NaiveDate,
    pub time_spent: i64,
    pub what_i_learned: String,
    pub resources_to_remember: String,
    pub tags: BTreeSet<String>,
}

/// Entry joined with its author and a comma separated tag list
#[derive(FromRow)]
struct EntryRow {
    #[sqlx(flatten)]
    entry: Entry,
    author: String,
    tag_list: Option<String>,
}

impl EntryRow {
    fn into_summary(self) -> EntrySummary {
        let mut tags: Vec<String> = self
            .tag_list
            .as_deref()
            .unwrap_or("")
            .split(',')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        tags.sort();
        EntrySummary {
            entry: self.entry,
            author: self.author,
            tags,
        }
    }
}

const SUMMARY_SELECT: &str = r#"
    SELECT e.*, u.username AS author, GROUP_CONCAT(t.name, ',') AS tag_list
    FROM entries e
    JOIN users u ON u.id = e.user_id
    LEFT JOIN entry_tags et ON et.entry_id = e.id
    LEFT JOIN tags t ON t.id = et.tag_id
"#;

// Newest first; the id breaks ties between entries on the same date.
const SUMMARY_ORDER: &str = "GROUP BY e.id ORDER BY e.date DESC, e.id DESC";

fn map_write_error(e: sqlx::Error) -> StoreError {
    if is_unique_violation(&e) {
        StoreError::DuplicateSlug
    } else {
        StoreError::Database(e)
    }
}

async fn load_entry(conn: &mut SqliteConnection, id: i64) -> Result<Entry, StoreError> {
    sqlx::query_as("SELECT * FROM entries WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(StoreError::NotFound)
}

/// Insert a new entry with a freshly resolved slug and its tags.
pub async fn create(pool: &SqlitePool, author_id: i64, input: &EntryInput) -> Result<Entry, StoreError> {
    let mut tx = pool.begin().await?;

    let slug = unique_slug(&mut tx, &input.title, None).await?;

    let entry: Entry = sqlx::query_as(
        r#"
        INSERT INTO entries (user_id, title, slug, date, time_spent, what_i_learned, resources_to_remember)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(author_id)
    .bind(&input.title)
    .bind(&slug)
    .bind(input.date)
    .bind(input.time_spent)
    .bind(&input.what_i_learned)
    .bind(&input.resources_to_remember)
    .fetch_one(&mut *tx)
    .await
    .map_err(map_write_error)?;

    tags::attach(&mut tx, entry.id, &input.tags).await?;
    tx.commit().await?;

    tracing::info!(entry_id = entry.id, slug = %entry.slug, "Created entry");
    Ok(entry)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Entry, StoreError> {
    sqlx::query_as("SELECT * FROM entries WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(StoreError::from_lookup)
}

pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Entry, StoreError> {
    sqlx::query_as("SELECT * FROM entries WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .map_err(StoreError::from_lookup)
}

/// Look an entry up by numeric id, falling back to the slug.
///
/// The fallback lets an entry titled e.g. "2024" be reached through its slug
/// when no entry has that id.
pub async fn find(pool: &SqlitePool, key: &str) -> Result<Entry, StoreError> {
    if let Ok(id) = key.parse::<i64>() {
        match find_by_id(pool, id).await {
            Err(StoreError::NotFound) => {}
            found => return found,
        }
    }
    find_by_slug(pool, key).await
}

/// The entry behind `key` with its author and tags.
pub async fn detail(pool: &SqlitePool, key: &str) -> Result<EntrySummary, StoreError> {
    let entry = find(pool, key).await?;
    detail_by_id(pool, entry.id).await
}

pub async fn detail_by_id(pool: &SqlitePool, id: i64) -> Result<EntrySummary, StoreError> {
    let row: Option<EntryRow> = sqlx::query_as(&format!("{SUMMARY_SELECT} WHERE e.id = ? {SUMMARY_ORDER}"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(EntryRow::into_summary).ok_or(StoreError::NotFound)
}

/// Every entry, newest first.
pub async fn list(pool: &SqlitePool) -> Result<Vec<EntrySummary>, StoreError> {
    let rows: Vec<EntryRow> = sqlx::query_as(&format!("{SUMMARY_SELECT} {SUMMARY_ORDER}"))
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(EntryRow::into_summary).collect())
}

/// Entries carrying `tag`, newest first. Unknown tags and tags without
/// entries are both `NotFound`.
pub async fn list_by_tag(pool: &SqlitePool, tag: &str) -> Result<Vec<EntrySummary>, StoreError> {
    let tag = tags::find_by_name(pool, tag).await?;

    let rows: Vec<EntryRow> = sqlx::query_as(&format!(
        "{SUMMARY_SELECT} WHERE e.id IN (SELECT entry_id FROM entry_tags WHERE tag_id = ?) {SUMMARY_ORDER}"
    ))
    .bind(tag.id)
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Err(StoreError::NotFound);
    }
    Ok(rows.into_iter().map(EntryRow::into_summary).collect())
}

/// Overwrite an entry's fields and tag set. Only its author may do this.
///
/// The slug is re-resolved when the title changes; the entry's own slug is
/// not treated as a collision, so a cosmetic retitle keeps the same URL.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    editor_id: i64,
    input: &EntryInput,
) -> Result<Entry, StoreError> {
    let mut tx = pool.begin().await?;

    let current = load_entry(&mut tx, id).await?;
    if !current.is_authored_by(editor_id) {
        return Err(StoreError::NotAuthor);
    }

    let slug = if current.title != input.title {
        unique_slug(&mut tx, &input.title, Some(id)).await?
    } else {
        current.slug
    };

    let entry: Entry = sqlx::query_as(
        r#"
        UPDATE entries
        SET title = ?, slug = ?, date = ?, time_spent = ?, what_i_learned = ?, resources_to_remember = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&input.title)
    .bind(&slug)
    .bind(input.date)
    .bind(input.time_spent)
    .bind(&input.what_i_learned)
    .bind(&input.resources_to_remember)
    .bind(id)
    .fetch_one(&mut *tx)
    .await
    .map_err(map_write_error)?;

    tags::replace(&mut tx, id, &input.tags).await?;
    tx.commit().await?;

    tracing::info!(entry_id = id, slug = %entry.slug, "Updated entry");
    Ok(entry)
}

/// Remove an entry, its tag links and any tags left unused.
///
/// A requester other than the author gets `NotAuthor` and nothing changes.
pub async fn delete(pool: &SqlitePool, id: i64, requester_id: i64) -> Result<(), StoreError> {
    let mut tx = pool.begin().await?;

    let entry = load_entry(&mut tx, id).await?;
    if !entry.is_authored_by(requester_id) {
        return Err(StoreError::NotAuthor);
    }

    sqlx::query("DELETE FROM entry_tags WHERE entry_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM entries WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tags::prune_orphans(&mut tx).await?;

    tx.commit().await?;

    tracing::info!(entry_id = id, "Deleted entry");
    Ok(())
}
