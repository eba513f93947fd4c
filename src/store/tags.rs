use std::collections::BTreeSet;

use sqlx::{SqliteConnection, SqlitePool};

use super::StoreError;
use crate::models::Tag;

/// Insert `name` or return the id of the existing tag, in one statement.
pub async fn upsert(conn: &mut SqliteConnection, name: &str) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO tags (name) VALUES (?)
        ON CONFLICT(name) DO UPDATE SET name = excluded.name
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

/// Link every tag in `names` to the entry, creating tags as needed.
pub async fn attach(
    conn: &mut SqliteConnection,
    entry_id: i64,
    names: &BTreeSet<String>,
) -> Result<(), sqlx::Error> {
    for name in names {
        let tag_id = upsert(conn, name).await?;
        sqlx::query("INSERT OR IGNORE INTO entry_tags (entry_id, tag_id) VALUES (?, ?)")
            .bind(entry_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Make the entry's tag set exactly `names`; stale links are removed.
pub async fn replace(
    conn: &mut SqliteConnection,
    entry_id: i64,
    names: &BTreeSet<String>,
) -> Result<(), sqlx::Error> {
    let current: BTreeSet<String> = names_for_entry(conn, entry_id).await?.into_iter().collect();

    for stale in current.difference(names) {
        sqlx::query(
            r#"
            DELETE FROM entry_tags
            WHERE entry_id = ? AND tag_id = (SELECT id FROM tags WHERE name = ?)
            "#,
        )
        .bind(entry_id)
        .bind(stale)
        .execute(&mut *conn)
        .await?;
    }

    let added: BTreeSet<String> = names.difference(&current).cloned().collect();
    attach(conn, entry_id, &added).await?;
    prune_orphans(conn).await?;
    Ok(())
}

/// Delete tags no entry refers to any more. Returns how many were removed.
pub async fn prune_orphans(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM tags WHERE NOT EXISTS (SELECT 1 FROM entry_tags et WHERE et.tag_id = tags.id)",
    )
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() > 0 {
        tracing::debug!(removed = result.rows_affected(), "Pruned orphaned tags");
    }
    Ok(result.rows_affected())
}

/// Tag names of one entry, alphabetically.
pub async fn names_for_entry(
    conn: &mut SqliteConnection,
    entry_id: i64,
) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT t.name FROM tags t
        JOIN entry_tags et ON et.tag_id = t.id
        WHERE et.entry_id = ?
        ORDER BY t.name ASC
        "#,
    )
    .bind(entry_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(|(name,)| name).collect())
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Tag, StoreError> {
    sqlx::query_as("SELECT * FROM tags WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(StoreError::from_lookup)
}
