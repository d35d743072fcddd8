//! Motivational messages: the one collection that is not branch-scoped.

use anyhow::{Context, Result};
use sqlx::{Row, SqliteConnection};

#[derive(Debug, Clone, PartialEq)]
pub struct MotivationRow {
    pub id: i64,
    pub text: String,
    pub is_active: bool,
}

pub async fn all(conn: &mut SqliteConnection) -> Result<Vec<MotivationRow>> {
    let rows = sqlx::query("SELECT id, text, is_active FROM motivation_messages ORDER BY id")
        .fetch_all(conn)
        .await
        .context("loading motivation messages")?;
    rows.iter()
        .map(|row| {
            Ok(MotivationRow {
                id: row.try_get("id")?,
                text: row.try_get("text")?,
                is_active: row.try_get("is_active")?,
            })
        })
        .collect()
}

pub async fn delete_all(conn: &mut SqliteConnection) -> Result<u64> {
    let result = sqlx::query("DELETE FROM motivation_messages")
        .execute(conn)
        .await
        .context("deleting motivation messages")?;
    Ok(result.rows_affected())
}

pub async fn insert(conn: &mut SqliteConnection, text: &str) -> Result<i64> {
    let result = sqlx::query("INSERT INTO motivation_messages (text) VALUES (?)")
        .bind(text)
        .execute(conn)
        .await
        .context("inserting motivation message")?;
    Ok(result.last_insert_rowid())
}
