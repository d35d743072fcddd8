//! Assessment hierarchy: Test → Question → Answer.
//!
//! Deleted and rebuilt wholesale on every sync. Question and answer rows
//! hang off their parents with cascading deletes; attempt history is
//! decoupled (see `attempts`).

use anyhow::{Context, Result};
use smena_core::{AnswerDraft, QuestionDraft, QuizDraft, StaffRole};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

#[derive(Debug, Clone, PartialEq)]
pub struct TestRow {
    pub id: i64,
    pub title: String,
    pub role: StaffRole,
    pub passing_score: i64,
    pub max_attempts: i64,
    pub seconds_per_question: i64,
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRow {
    pub id: i64,
    pub test_id: i64,
    pub text: String,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRow {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
}

fn test_from_row(row: &SqliteRow) -> Result<TestRow> {
    let role_text: String = row.try_get("role")?;
    Ok(TestRow {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        role: StaffRole::parse(&role_text)
            .with_context(|| format!("unknown role '{role_text}' in tests table"))?,
        passing_score: row.try_get("passing_score")?,
        max_attempts: row.try_get("max_attempts")?,
        seconds_per_question: row.try_get("seconds_per_question")?,
        branch: row.try_get("branch")?,
    })
}

const TEST_COLUMNS: &str =
    "id, title, role, passing_score, max_attempts, seconds_per_question, branch";

pub async fn tests_for_branch(conn: &mut SqliteConnection, branch: &str) -> Result<Vec<TestRow>> {
    let rows = sqlx::query(&format!(
        "SELECT {TEST_COLUMNS} FROM tests WHERE branch = ? ORDER BY title"
    ))
    .bind(branch)
    .fetch_all(conn)
    .await
    .context("loading tests for branch")?;
    rows.iter().map(test_from_row).collect()
}

pub async fn tests_for_role(
    conn: &mut SqliteConnection,
    branch: &str,
    role: StaffRole,
) -> Result<Vec<TestRow>> {
    let rows = sqlx::query(&format!(
        "SELECT {TEST_COLUMNS} FROM tests WHERE branch = ? AND role = ? ORDER BY title"
    ))
    .bind(branch)
    .bind(role.as_str())
    .fetch_all(conn)
    .await
    .context("loading tests for role")?;
    rows.iter().map(test_from_row).collect()
}

/// Children go through `ON DELETE CASCADE`; attempts are left in place
/// with their test link nulled.
pub async fn delete_branch(conn: &mut SqliteConnection, branch: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM tests WHERE branch = ?")
        .bind(branch)
        .execute(conn)
        .await
        .context("deleting tests for branch")?;
    Ok(result.rows_affected())
}

pub async fn insert_test(conn: &mut SqliteConnection, draft: &QuizDraft) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO tests (title, role, passing_score, max_attempts, seconds_per_question, branch)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&draft.title)
    .bind(draft.role.as_str())
    .bind(draft.passing_score)
    .bind(draft.max_attempts)
    .bind(draft.seconds_per_question)
    .bind(&draft.branch)
    .execute(conn)
    .await
    .context("inserting test")?;
    Ok(result.last_insert_rowid())
}

pub async fn insert_question(
    conn: &mut SqliteConnection,
    test_id: i64,
    draft: &QuestionDraft,
) -> Result<i64> {
    let result = sqlx::query("INSERT INTO questions (test_id, text, position) VALUES (?, ?, ?)")
        .bind(test_id)
        .bind(&draft.text)
        .bind(draft.position)
        .execute(conn)
        .await
        .context("inserting question")?;
    Ok(result.last_insert_rowid())
}

pub async fn insert_answer(
    conn: &mut SqliteConnection,
    question_id: i64,
    draft: &AnswerDraft,
) -> Result<i64> {
    let result = sqlx::query("INSERT INTO answers (question_id, text, is_correct) VALUES (?, ?, ?)")
        .bind(question_id)
        .bind(&draft.text)
        .bind(draft.is_correct)
        .execute(conn)
        .await
        .context("inserting answer")?;
    Ok(result.last_insert_rowid())
}

pub async fn questions_for_test(
    conn: &mut SqliteConnection,
    test_id: i64,
) -> Result<Vec<QuestionRow>> {
    let rows = sqlx::query(
        "SELECT id, test_id, text, position FROM questions WHERE test_id = ? ORDER BY position",
    )
    .bind(test_id)
    .fetch_all(conn)
    .await
    .context("loading questions for test")?;
    rows.iter()
        .map(|row| {
            Ok(QuestionRow {
                id: row.try_get("id")?,
                test_id: row.try_get("test_id")?,
                text: row.try_get("text")?,
                position: row.try_get("position")?,
            })
        })
        .collect()
}

pub async fn answers_for_question(
    conn: &mut SqliteConnection,
    question_id: i64,
) -> Result<Vec<AnswerRow>> {
    let rows = sqlx::query(
        "SELECT id, question_id, text, is_correct FROM answers WHERE question_id = ? ORDER BY id",
    )
    .bind(question_id)
    .fetch_all(conn)
    .await
    .context("loading answers for question")?;
    rows.iter()
        .map(|row| {
            Ok(AnswerRow {
                id: row.try_get("id")?,
                question_id: row.try_get("question_id")?,
                text: row.try_get("text")?,
                is_correct: row.try_get("is_correct")?,
            })
        })
        .collect()
}
