//! Env-driven engine configuration.

use std::path::PathBuf;

/// Branch used by the pilot deployment when the env leaves it unset and
/// when a staff row's branch cell is blank.
pub const DEFAULT_BRANCH: &str = "Бистро \"ГАВРОШ\" (Пушкинская 36/69)";

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub database_url: String,
    pub spreadsheet_id: String,
    pub api_key: String,
    pub files_dir: PathBuf,
    pub branch: String,
    pub http_timeout_secs: u64,
    pub sheet_catalog_path: Option<PathBuf>,
}

impl SyncConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://smena.db".to_string()),
            spreadsheet_id: std::env::var("SMENA_SPREADSHEET_ID").unwrap_or_default(),
            api_key: std::env::var("SMENA_SHEETS_API_KEY").unwrap_or_default(),
            files_dir: std::env::var("SMENA_FILES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./files")),
            branch: std::env::var("SMENA_BRANCH").unwrap_or_else(|_| DEFAULT_BRANCH.to_string()),
            http_timeout_secs: std::env::var("SMENA_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            sheet_catalog_path: std::env::var("SMENA_SHEET_CATALOG").ok().map(PathBuf::from),
        }
    }
}
