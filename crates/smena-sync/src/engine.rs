//! Full-spreadsheet reconciliation.
//!
//! One `run` re-imports every content domain from the source. Domains are
//! isolated: each runs inside its own transaction and its own error
//! boundary, so a malformed worksheet spoils only its own section of the
//! report. The initial metadata call is the one fatal step — without it no
//! worksheet can be resolved.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use smena_core::{
    AssessmentReport, ChecklistReport, EmployeeReport, MenuReport, MotivationReport, SyncReport,
    TrainingReport,
};
use smena_sheets::catalog::SheetCatalog;
use smena_sheets::client::{RawRow, SheetSource};
use smena_sheets::rows;
use smena_storage::files::{materialize, FileFetcher, FileStore};
use smena_storage::{checklists, employees, menu, motivation, quizzes, training};
use sqlx::SqlitePool;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::carryover::{carry_menu_state, fold_key, previous_training_files};
use crate::config::SyncConfig;

pub struct SyncEngine<S> {
    pool: SqlitePool,
    source: Arc<S>,
    catalog: SheetCatalog,
    files: FileStore,
    fetcher: FileFetcher,
    branch: String,
}

impl<S: SheetSource + 'static> SyncEngine<S> {
    pub fn new(
        pool: SqlitePool,
        source: Arc<S>,
        catalog: SheetCatalog,
        files: FileStore,
        fetcher: FileFetcher,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            source,
            catalog,
            files,
            fetcher,
            branch: branch.into(),
        }
    }

    /// Drive one blocking source call off the async runtime.
    async fn read_sheet(&self, sheet: &str) -> Result<Vec<RawRow>> {
        let source = Arc::clone(&self.source);
        let sheet = sheet.to_string();
        let sheet_for_task = sheet.clone();
        tokio::task::spawn_blocking(move || source.sheet_rows(&sheet_for_task))
            .await
            .context("sheet read task panicked")?
            .with_context(|| format!("reading worksheet {sheet:?}"))
    }

    pub async fn run(&self) -> SyncReport {
        let run_id = Uuid::new_v4();
        let mut report = SyncReport::new(run_id, Utc::now());
        let span = info_span!("sync_run", %run_id, branch = %self.branch);

        async {
            let source = Arc::clone(&self.source);
            let connected = tokio::task::spawn_blocking(move || source.connect()).await;
            match connected {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(error = %err, "source connect failed, aborting run");
                    report.success = false;
                    report.connect_error = Some(err.to_string());
                    report.finished_at = Utc::now();
                    return;
                }
                Err(err) => {
                    report.success = false;
                    report.connect_error = Some(format!("connect task panicked: {err}"));
                    report.finished_at = Utc::now();
                    return;
                }
            }

            match self.sync_employees().await {
                Ok(r) => report.employees = r,
                Err(err) => report.employees.error = Some(format!("{err:#}")),
            }
            match self.sync_menu().await {
                Ok(r) => report.menu = r,
                Err(err) => report.menu.error = Some(format!("{err:#}")),
            }
            match self.sync_training().await {
                Ok(r) => report.training = r,
                Err(err) => report.training.error = Some(format!("{err:#}")),
            }
            match self.sync_assessments().await {
                Ok(r) => report.assessments = r,
                Err(err) => report.assessments.error = Some(format!("{err:#}")),
            }
            match self.sync_checklists().await {
                Ok(r) => report.checklists = r,
                Err(err) => report.checklists.error = Some(format!("{err:#}")),
            }
            match self.sync_motivation().await {
                Ok(r) => report.motivation = r,
                Err(err) => report.motivation.error = Some(format!("{err:#}")),
            }

            // Domain failures stay in their own report fragment; the
            // top-level flag answers only "did we reach the source".
            report.finished_at = Utc::now();
            for (domain, error) in report.domain_errors() {
                warn!(domain, error, "domain sync failed");
            }
            info!(
                success = report.success,
                domain_failures = report.domain_errors().len(),
                "sync run finished"
            );
        }
        .instrument(span)
        .await;

        report
    }

    /// Staff roster is the one domain that updates in place: matched rows
    /// keep their id (and with it the chat binding), unmatched source rows
    /// are created, and stored rows the source no longer lists are
    /// deactivated rather than deleted.
    async fn sync_employees(&self) -> Result<EmployeeReport> {
        let raw = self.read_sheet(&self.catalog.staff).await?;
        let drafts = rows::employee_rows(&raw, &self.branch);
        let mut report = EmployeeReport::default();

        let mut tx = self.pool.begin().await.context("beginning staff tx")?;
        let existing = employees::all_for_branch(&mut *tx, &self.branch).await?;

        let mut by_phone: HashMap<String, usize> = HashMap::new();
        let mut by_handle: HashMap<String, usize> = HashMap::new();
        for (idx, row) in existing.iter().enumerate() {
            if let Some(phone) = &row.phone {
                by_phone.insert(rows::normalize_phone(phone), idx);
            }
            if let Some(handle) = &row.handle {
                by_handle.insert(fold_key(handle), idx);
            }
        }

        let mut matched = vec![false; existing.len()];
        for draft in &drafts {
            let hit = draft
                .phone
                .as_deref()
                .and_then(|p| by_phone.get(&rows::normalize_phone(p)))
                .or_else(|| {
                    draft
                        .handle
                        .as_deref()
                        .and_then(|h| by_handle.get(&fold_key(h)))
                })
                .copied();

            match hit {
                Some(idx) => {
                    matched[idx] = true;
                    employees::update_from_source(&mut *tx, existing[idx].id, draft).await?;
                    report.updated += 1;
                }
                None => {
                    employees::insert(&mut *tx, draft).await?;
                    report.created += 1;
                }
            }
        }

        for (idx, row) in existing.iter().enumerate() {
            if !matched[idx] && row.is_active {
                employees::deactivate(&mut *tx, row.id).await?;
                report.deactivated += 1;
            }
        }

        tx.commit().await.context("committing staff tx")?;
        info!(
            created = report.created,
            updated = report.updated,
            deactivated = report.deactivated,
            "staff synced"
        );
        Ok(report)
    }

    /// Menu worksheets are replaced wholesale, with availability and photo
    /// carried across from the rows being replaced.
    async fn sync_menu(&self) -> Result<MenuReport> {
        let mut drafts = Vec::new();
        for sheet in &self.catalog.menu {
            let raw = self.read_sheet(&sheet.sheet).await?;
            drafts.extend(rows::menu_rows(&raw, sheet, &self.branch));
        }

        let mut tx = self.pool.begin().await.context("beginning menu tx")?;
        let existing = menu::all_for_branch(&mut *tx, &self.branch).await?;
        let carried = carry_menu_state(&mut drafts, &existing);
        menu::delete_branch(&mut *tx, &self.branch).await?;
        for draft in &drafts {
            menu::insert(&mut *tx, draft).await?;
        }
        tx.commit().await.context("committing menu tx")?;

        info!(
            inserted = drafts.len(),
            carried_status = carried.status,
            carried_photos = carried.photos,
            "menu synced"
        );
        Ok(MenuReport {
            inserted: drafts.len(),
            carried_status: carried.status,
            carried_photos: carried.photos,
            error: None,
        })
    }

    async fn sync_training(&self) -> Result<TrainingReport> {
        let mut drafts = Vec::new();
        for role_sheet in &self.catalog.training {
            let raw = self.read_sheet(&role_sheet.sheet).await?;
            drafts.extend(rows::training_rows(&raw, role_sheet.role, &self.branch));
        }
        let mut report = TrainingReport::default();

        let mut tx = self.pool.begin().await.context("beginning training tx")?;
        let existing = training::all_for_branch(&mut *tx, &self.branch).await?;
        let previous = previous_training_files(&existing);
        training::delete_branch(&mut *tx, &self.branch).await?;

        for draft in &mut drafts {
            let prior = previous.get(&fold_key(&draft.title)).cloned();
            let outcome = materialize(
                &self.fetcher,
                &self.files,
                &draft.title,
                draft.file_url.as_deref(),
                prior,
            )
            .await;
            if outcome.downloaded {
                report.files_downloaded += 1;
            } else if outcome.path.is_some() {
                report.files_kept += 1;
            }
            draft.file_path = outcome.path;
            training::insert(&mut *tx, draft).await?;
            report.inserted += 1;
        }

        tx.commit().await.context("committing training tx")?;
        info!(
            inserted = report.inserted,
            downloaded = report.files_downloaded,
            kept = report.files_kept,
            "training synced"
        );
        Ok(report)
    }

    /// Tests, questions and answers are replaced as a tree. Historical
    /// attempts are never touched: their foreign key nulls out and the
    /// snapshot columns keep the record readable.
    async fn sync_assessments(&self) -> Result<AssessmentReport> {
        let raw = self.read_sheet(&self.catalog.assessments).await?;
        let quizzes_fresh = rows::quiz_rows(&raw, &self.branch);
        let mut report = AssessmentReport::default();

        let mut tx = self.pool.begin().await.context("beginning assessment tx")?;
        quizzes::delete_branch(&mut *tx, &self.branch).await?;
        for quiz in &quizzes_fresh {
            let test_id = quizzes::insert_test(&mut *tx, quiz).await?;
            report.tests += 1;
            for question in &quiz.questions {
                let question_id = quizzes::insert_question(&mut *tx, test_id, question).await?;
                report.questions += 1;
                for answer in &question.answers {
                    quizzes::insert_answer(&mut *tx, question_id, answer).await?;
                }
            }
        }
        tx.commit().await.context("committing assessment tx")?;

        info!(
            tests = report.tests,
            questions = report.questions,
            "assessments synced"
        );
        Ok(report)
    }

    async fn sync_checklists(&self) -> Result<ChecklistReport> {
        let mut drafts = Vec::new();
        for role_sheet in &self.catalog.checklists {
            let raw = self.read_sheet(&role_sheet.sheet).await?;
            drafts.extend(rows::checklist_rows(&raw, role_sheet.role, &self.branch));
        }

        let mut tx = self.pool.begin().await.context("beginning checklist tx")?;
        checklists::delete_branch(&mut *tx, &self.branch).await?;
        for draft in &drafts {
            checklists::insert(&mut *tx, draft).await?;
        }
        tx.commit().await.context("committing checklist tx")?;

        info!(inserted = drafts.len(), "checklists synced");
        Ok(ChecklistReport {
            inserted: drafts.len(),
            error: None,
        })
    }

    /// Motivation texts are branch-free; the whole table is replaced.
    async fn sync_motivation(&self) -> Result<MotivationReport> {
        let raw = self.read_sheet(&self.catalog.motivation).await?;
        let texts = rows::motivation_rows(&raw);

        let mut tx = self.pool.begin().await.context("beginning motivation tx")?;
        motivation::delete_all(&mut *tx).await?;
        for text in &texts {
            motivation::insert(&mut *tx, text).await?;
        }
        tx.commit().await.context("committing motivation tx")?;

        info!(inserted = texts.len(), "motivation synced");
        Ok(MotivationReport {
            inserted: texts.len(),
            error: None,
        })
    }
}

/// Wire the engine from environment config and run a single pass.
pub async fn run_sync_once_from_env() -> Result<SyncReport> {
    let config = SyncConfig::from_env();
    anyhow::ensure!(
        !config.spreadsheet_id.is_empty(),
        "SMENA_SPREADSHEET_ID is not set"
    );

    let pool = smena_storage::connect(&config.database_url).await?;
    let catalog = match &config.sheet_catalog_path {
        Some(path) => SheetCatalog::from_yaml_file(path)?,
        None => SheetCatalog::default(),
    };
    let timeout = std::time::Duration::from_secs(config.http_timeout_secs);
    let client = smena_sheets::client::GoogleSheetClient::new(
        config.spreadsheet_id.clone(),
        config.api_key.clone(),
        timeout,
    )
    .context("building sheets client")?;
    let files = FileStore::new(config.files_dir.clone());
    let fetcher = FileFetcher::new(timeout)?;

    let engine = SyncEngine::new(
        pool,
        Arc::new(client),
        catalog,
        files,
        fetcher,
        config.branch.clone(),
    );
    Ok(engine.run().await)
}
