//! Blocking Sheets values-API client behind the `SheetSource` seam.
//!
//! All calls here block on network I/O; the sync engine drives them
//! through `spawn_blocking` so the interactive scheduler never stalls.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{info, warn};

pub type RawRow = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("malformed source response: {0}")]
    Malformed(String),
}

/// Read access to one multi-sheet tabular source.
///
/// `connect` is called once per sync run and is fatal for the run when it
/// fails; `sheet_rows` is lenient: a worksheet that does not exist yields
/// an empty list, never an error.
pub trait SheetSource: Send + Sync {
    fn connect(&self) -> Result<(), SourceError>;
    fn sheet_rows(&self, sheet: &str) -> Result<Vec<RawRow>, SourceError>;
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<JsonValue>>,
}

/// Values-API client for one spreadsheet. The base URL is injectable so
/// tests can point it at a local server.
#[derive(Debug)]
pub struct GoogleSheetClient {
    http: reqwest::blocking::Client,
    base_url: String,
    spreadsheet_id: String,
    api_key: String,
    titles: RwLock<Vec<String>>,
}

impl GoogleSheetClient {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: "https://sheets.googleapis.com".to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            api_key: api_key.into(),
            titles: RwLock::new(Vec::new()),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| SourceError::Malformed(format!("bad base url: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| SourceError::Malformed("base url cannot be a base".into()))?
            .extend(segments);
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, SourceError> {
        let display_url = {
            let mut u = url.clone();
            u.set_query(None);
            u.to_string()
        };
        let response = self.http.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                status: status.as_u16(),
                url: display_url,
            });
        }
        response.json::<T>().map_err(SourceError::from)
    }

    /// Resolve a worksheet title against the cached list, tolerating
    /// stray whitespace in the authored titles.
    fn resolve_title(&self, want: &str) -> Option<String> {
        let titles = self.titles.read().unwrap_or_else(|e| e.into_inner());
        titles
            .iter()
            .find(|t| t.as_str() == want)
            .or_else(|| titles.iter().find(|t| t.trim() == want.trim()))
            .cloned()
    }
}

impl SheetSource for GoogleSheetClient {
    fn connect(&self) -> Result<(), SourceError> {
        let mut url = self.endpoint(&["v4", "spreadsheets", &self.spreadsheet_id])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");
        let meta: SpreadsheetMeta = self.get_json(url)?;
        let titles: Vec<String> = meta
            .sheets
            .into_iter()
            .map(|s| s.properties.title)
            .collect();
        info!(worksheets = titles.len(), "connected to spreadsheet");
        *self.titles.write().unwrap_or_else(|e| e.into_inner()) = titles;
        Ok(())
    }

    fn sheet_rows(&self, sheet: &str) -> Result<Vec<RawRow>, SourceError> {
        let Some(title) = self.resolve_title(sheet) else {
            warn!(sheet, "worksheet not found in spreadsheet");
            return Ok(Vec::new());
        };
        let url = self.endpoint(&["v4", "spreadsheets", &self.spreadsheet_id, "values", &title])?;
        let range: ValueRange = self.get_json(url)?;
        Ok(rows_from_values(&range.values))
    }
}

/// First row is the header; remaining rows become header→cell maps.
/// Headers are trimmed and de-duplicated with a counter suffix so a
/// sheet with repeated column labels still yields addressable cells.
pub fn rows_from_values(values: &[Vec<JsonValue>]) -> Vec<RawRow> {
    if values.len() < 2 {
        return Vec::new();
    }
    let headers = uniquify_headers(values[0].iter().map(cell_text));
    values[1..]
        .iter()
        .map(|row| {
            let mut record = RawRow::with_capacity(headers.len());
            for (i, cell) in row.iter().enumerate() {
                if let Some(header) = headers.get(i) {
                    record.insert(header.clone(), cell_text(cell));
                }
            }
            record
        })
        .collect()
}

pub fn uniquify_headers(raw: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::new();
    for header in raw {
        let header = header.trim().to_string();
        match seen.get_mut(&header) {
            Some(count) => {
                *count += 1;
                out.push(format!("{header}_{count}"));
            }
            None => {
                seen.insert(header.clone(), 0);
                out.push(header);
            }
        }
    }
    out
}

fn cell_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duplicate_headers_get_counter_suffixes() {
        let headers = uniquify_headers(
            ["Ответ", "Ответ ", "Вопрос", "Ответ"]
                .iter()
                .map(|s| s.to_string()),
        );
        assert_eq!(headers, vec!["Ответ", "Ответ_1", "Вопрос", "Ответ_2"]);
    }

    #[test]
    fn rows_map_cells_to_trimmed_headers() {
        let values = vec![
            vec![json!(" Название блюда "), json!("Цена (руб.)")],
            vec![json!("Сырники"), json!(320)],
            vec![json!("Борщ")],
        ];
        let rows = rows_from_values(&values);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Название блюда"], "Сырники");
        assert_eq!(rows[0]["Цена (руб.)"], "320");
        assert_eq!(rows[1]["Название блюда"], "Борщ");
        assert!(rows[1].get("Цена (руб.)").is_none());
    }

    #[test]
    fn header_only_sheet_yields_no_rows() {
        let values = vec![vec![json!("Задача")]];
        assert!(rows_from_values(&values).is_empty());
    }
}
