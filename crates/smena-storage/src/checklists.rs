//! Checklist tasks: pure append per sync, grouped by role and category.

use anyhow::{Context, Result};
use smena_core::{ChecklistDraft, StaffRole};
use sqlx::{Row, SqliteConnection};

#[derive(Debug, Clone, PartialEq)]
pub struct ChecklistRow {
    pub id: i64,
    pub role: StaffRole,
    pub category: Option<String>,
    pub task: String,
    pub position: i64,
    pub branch: String,
}

pub async fn all_for_branch(
    conn: &mut SqliteConnection,
    branch: &str,
) -> Result<Vec<ChecklistRow>> {
    let rows = sqlx::query(
        "SELECT id, role, category, task, position, branch
           FROM checklist_items
          WHERE branch = ?
          ORDER BY role, position",
    )
    .bind(branch)
    .fetch_all(conn)
    .await
    .context("loading checklist items for branch")?;
    rows.iter()
        .map(|row| {
            let role_text: String = row.try_get("role")?;
            Ok(ChecklistRow {
                id: row.try_get("id")?,
                role: StaffRole::parse(&role_text)
                    .with_context(|| format!("unknown role '{role_text}' in checklist_items"))?,
                category: row.try_get("category")?,
                task: row.try_get("task")?,
                position: row.try_get("position")?,
                branch: row.try_get("branch")?,
            })
        })
        .collect()
}

pub async fn delete_branch(conn: &mut SqliteConnection, branch: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM checklist_items WHERE branch = ?")
        .bind(branch)
        .execute(conn)
        .await
        .context("deleting checklist items for branch")?;
    Ok(result.rows_affected())
}

pub async fn insert(conn: &mut SqliteConnection, draft: &ChecklistDraft) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO checklist_items (role, category, task, position, branch)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(draft.role.as_str())
    .bind(&draft.category)
    .bind(&draft.task)
    .bind(draft.position)
    .bind(&draft.branch)
    .execute(conn)
    .await
    .context("inserting checklist item")?;
    Ok(result.last_insert_rowid())
}
