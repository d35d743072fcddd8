//! Quiz attempt history.
//!
//! Written by the quiz-taking runtime, read by reporting. The sync
//! engine must never delete or rewrite these rows; the assessment
//! rebuild only nulls the live `test_id` link, and the stored title/role
//! snapshot keeps history attributable.

use anyhow::{Context, Result};
use sqlx::{Row, SqliteConnection};

#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRow {
    pub id: i64,
    pub employee_id: i64,
    pub test_id: Option<i64>,
    pub test_title: String,
    pub test_role: String,
    pub score: i64,
    pub total_questions: i64,
    pub percent: f64,
    pub passed: bool,
    pub branch: String,
}

#[derive(Debug, Clone)]
pub struct NewAttempt<'a> {
    pub employee_id: i64,
    pub test_id: i64,
    pub test_title: &'a str,
    pub test_role: &'a str,
    pub score: i64,
    pub total_questions: i64,
    pub percent: f64,
    pub passed: bool,
    pub branch: &'a str,
}

pub async fn insert(conn: &mut SqliteConnection, attempt: &NewAttempt<'_>) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO quiz_attempts (employee_id, test_id, test_title, test_role, score,
                                    total_questions, percent, passed, branch)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(attempt.employee_id)
    .bind(attempt.test_id)
    .bind(attempt.test_title)
    .bind(attempt.test_role)
    .bind(attempt.score)
    .bind(attempt.total_questions)
    .bind(attempt.percent)
    .bind(attempt.passed)
    .bind(attempt.branch)
    .execute(conn)
    .await
    .context("inserting quiz attempt")?;
    Ok(result.last_insert_rowid())
}

pub async fn for_employee(conn: &mut SqliteConnection, employee_id: i64) -> Result<Vec<AttemptRow>> {
    let rows = sqlx::query(
        "SELECT id, employee_id, test_id, test_title, test_role, score, total_questions,
                percent, passed, branch
           FROM quiz_attempts
          WHERE employee_id = ?
          ORDER BY id",
    )
    .bind(employee_id)
    .fetch_all(conn)
    .await
    .context("loading attempts for employee")?;
    rows.iter()
        .map(|row| {
            Ok(AttemptRow {
                id: row.try_get("id")?,
                employee_id: row.try_get("employee_id")?,
                test_id: row.try_get("test_id")?,
                test_title: row.try_get("test_title")?,
                test_role: row.try_get("test_role")?,
                score: row.try_get("score")?,
                total_questions: row.try_get("total_questions")?,
                percent: row.try_get("percent")?,
                passed: row.try_get("passed")?,
                branch: row.try_get("branch")?,
            })
        })
        .collect()
}
