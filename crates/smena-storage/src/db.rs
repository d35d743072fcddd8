//! Pool construction and embedded migrations.

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// Connect to the configured database and bring the schema up to date.
///
/// WAL mode matters here: each domain reconciliation is one write
/// transaction, and WAL readers keep seeing the pre-commit snapshot for
/// its whole delete+insert window, so no reader ever observes a
/// momentarily-empty collection.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("parsing database url {database_url}"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("connecting to database")?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Ephemeral single-connection in-memory store, used by tests and
/// throwaway runs. One connection, or every pool checkout would get its
/// own empty database.
pub async fn connect_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .context("parsing in-memory database url")?
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .context("connecting to in-memory database")?;
    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("running migrations")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrations_apply_on_fresh_database() {
        let pool = connect_memory().await.expect("pool");
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .expect("table list");
        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        for expected in [
            "employees",
            "menu_items",
            "training_materials",
            "tests",
            "questions",
            "answers",
            "quiz_attempts",
            "checklist_items",
            "motivation_messages",
        ] {
            assert!(names.contains(&expected), "missing table {expected}");
        }
    }
}
