//! Training material collection: replaced on sync, local file paths
//! carried forward by title.

use anyhow::{Context, Result};
use smena_core::{StaffRole, TrainingDraft};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub body: String,
    pub topic: Option<String>,
    pub file_path: Option<String>,
    pub role: StaffRole,
    pub position: i64,
    pub branch: String,
}

fn from_row(row: &SqliteRow) -> Result<TrainingRow> {
    let role_text: String = row.try_get("role")?;
    Ok(TrainingRow {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        body: row.try_get("body")?,
        topic: row.try_get("topic")?,
        file_path: row.try_get("file_path")?,
        role: StaffRole::parse(&role_text)
            .with_context(|| format!("unknown role '{role_text}' in training_materials"))?,
        position: row.try_get("position")?,
        branch: row.try_get("branch")?,
    })
}

pub async fn all_for_branch(conn: &mut SqliteConnection, branch: &str) -> Result<Vec<TrainingRow>> {
    let rows = sqlx::query(
        "SELECT id, title, description, body, topic, file_path, role, position, branch
           FROM training_materials
          WHERE branch = ?
          ORDER BY role, position",
    )
    .bind(branch)
    .fetch_all(conn)
    .await
    .context("loading training materials for branch")?;
    rows.iter().map(from_row).collect()
}

pub async fn delete_branch(conn: &mut SqliteConnection, branch: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM training_materials WHERE branch = ?")
        .bind(branch)
        .execute(conn)
        .await
        .context("deleting training materials for branch")?;
    Ok(result.rows_affected())
}

pub async fn insert(conn: &mut SqliteConnection, draft: &TrainingDraft) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO training_materials (title, description, body, topic, file_path,
                                         role, position, branch)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&draft.title)
    .bind(&draft.description)
    .bind(&draft.body)
    .bind(&draft.topic)
    .bind(&draft.file_path)
    .bind(draft.role.as_str())
    .bind(draft.position)
    .bind(&draft.branch)
    .execute(conn)
    .await
    .context("inserting training material")?;
    Ok(result.last_insert_rowid())
}

/// Operator upload path for the locally-owned file reference.
pub async fn set_file_path(
    conn: &mut SqliteConnection,
    id: i64,
    file_path: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE training_materials SET file_path = ? WHERE id = ?")
        .bind(file_path)
        .bind(id)
        .execute(conn)
        .await
        .context("setting training file path")?;
    Ok(())
}
