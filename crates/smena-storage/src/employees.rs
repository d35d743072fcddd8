//! Staff directory collection.
//!
//! Reconciliation never deletes from this table: rows missing from the
//! source pass are deactivated so progress and attempt history stays
//! attributable.

use anyhow::{Context, Result};
use smena_core::{EmployeeDraft, StaffRole};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeRow {
    pub id: i64,
    pub telegram_id: Option<i64>,
    pub handle: Option<String>,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: StaffRole,
    pub branch: String,
    pub is_active: bool,
}

fn from_row(row: &SqliteRow) -> Result<EmployeeRow> {
    let role_text: String = row.try_get("role")?;
    let role = StaffRole::parse(&role_text)
        .with_context(|| format!("unknown role '{role_text}' in employees table"))?;
    Ok(EmployeeRow {
        id: row.try_get("id")?,
        telegram_id: row.try_get("telegram_id")?,
        handle: row.try_get("handle")?,
        full_name: row.try_get("full_name")?,
        phone: row.try_get("phone")?,
        role,
        branch: row.try_get("branch")?,
        is_active: row.try_get("is_active")?,
    })
}

pub async fn all_for_branch(conn: &mut SqliteConnection, branch: &str) -> Result<Vec<EmployeeRow>> {
    let rows = sqlx::query(
        "SELECT id, telegram_id, handle, full_name, phone, role, branch, is_active
           FROM employees
          WHERE branch = ?
          ORDER BY full_name",
    )
    .bind(branch)
    .fetch_all(conn)
    .await
    .context("loading employees for branch")?;
    rows.iter().map(from_row).collect()
}

pub async fn by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<EmployeeRow>> {
    let row = sqlx::query(
        "SELECT id, telegram_id, handle, full_name, phone, role, branch, is_active
           FROM employees
          WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
    .context("loading employee by id")?;
    row.as_ref().map(from_row).transpose()
}

pub async fn insert(conn: &mut SqliteConnection, draft: &EmployeeDraft) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO employees (handle, full_name, phone, role, branch, is_active)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&draft.handle)
    .bind(&draft.full_name)
    .bind(&draft.phone)
    .bind(draft.role.as_str())
    .bind(&draft.branch)
    .bind(draft.is_active)
    .execute(conn)
    .await
    .context("inserting employee")?;
    Ok(result.last_insert_rowid())
}

/// Overwrite the source-authored fields of a matched row. The chat
/// binding (`telegram_id`) is locally owned and untouched; phone and
/// handle are only replaced when the source row carries them.
pub async fn update_from_source(
    conn: &mut SqliteConnection,
    id: i64,
    draft: &EmployeeDraft,
) -> Result<()> {
    sqlx::query(
        "UPDATE employees
            SET full_name = ?,
                role = ?,
                branch = ?,
                is_active = ?,
                phone = COALESCE(?, phone),
                handle = COALESCE(?, handle)
          WHERE id = ?",
    )
    .bind(&draft.full_name)
    .bind(draft.role.as_str())
    .bind(&draft.branch)
    .bind(draft.is_active)
    .bind(&draft.phone)
    .bind(&draft.handle)
    .bind(id)
    .execute(conn)
    .await
    .context("updating employee from source")?;
    Ok(())
}

pub async fn deactivate(conn: &mut SqliteConnection, id: i64) -> Result<()> {
    sqlx::query("UPDATE employees SET is_active = 0 WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await
        .context("deactivating employee")?;
    Ok(())
}

/// Chat-side binding write; lives here so tests can simulate a bound
/// account when checking that sync preserves it.
pub async fn bind_telegram(conn: &mut SqliteConnection, id: i64, telegram_id: i64) -> Result<()> {
    sqlx::query("UPDATE employees SET telegram_id = ? WHERE id = ?")
        .bind(telegram_id)
        .bind(id)
        .execute(conn)
        .await
        .context("binding telegram id")?;
    Ok(())
}
