//! File materialization: translate share links, download bytes, store
//! them under a deterministic title-derived path.
//!
//! Failure policy is keep-previous: an unrecognized link shape, a
//! transport error, a timeout or a non-2xx response all leave whichever
//! file was attached before, and never fail the surrounding domain.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::Context;
use regex::Regex;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
}

/// Known share-link shapes carrying an embedded file id. Order matters:
/// the generic `/d/` shape also matches `/file/d/` URLs.
fn drive_id_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"/file/d/([A-Za-z0-9_-]+)",
            r"[?&]id=([A-Za-z0-9_-]+)",
            r"/d/([A-Za-z0-9_-]+)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static pattern"))
        .collect()
    })
}

/// Rewrite a share link into a direct-download URL. Non-drive URLs pass
/// through unchanged; a drive URL with no recognizable file id is
/// rejected with `None`.
pub fn direct_download_url(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    if !url.contains("drive.google.com") {
        return Some(url.to_string());
    }
    for pattern in drive_id_patterns() {
        if let Some(captures) = pattern.captures(url) {
            let file_id = captures.get(1).map(|m| m.as_str())?;
            return Some(format!(
                "https://drive.google.com/uc?export=download&id={file_id}"
            ));
        }
    }
    warn!(url, "could not extract file id from share link");
    None
}

/// Keep letters, digits, spaces and underscores; everything else is
/// stripped so a human-authored title becomes a safe filename.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Local file storage rooted at one directory, keyed by sanitized title.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, title: &str) -> PathBuf {
        self.root.join(format!("{}.pdf", sanitize_title(title)))
    }

    /// Write bytes through a temp file and an atomic rename so a reader
    /// holding the old path never sees a half-written file.
    pub async fn write_bytes(&self, title: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
        let path = self.path_for(title);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating file directory {}", parent.display()))?;
        }

        let temp_name = format!(".{}.tmp", Uuid::new_v4());
        let temp_path = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(temp_name);

        let mut file = fs::File::create(&temp_path)
            .await
            .with_context(|| format!("opening temp file {}", temp_path.display()))?;
        file.write_all(bytes)
            .await
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("flushing temp file {}", temp_path.display()))?;
        drop(file);

        match fs::rename(&temp_path, &path).await {
            Ok(()) => Ok(path),
            Err(err) => {
                let _ = fs::remove_file(&temp_path).await;
                Err(err).with_context(|| {
                    format!(
                        "renaming temp file {} -> {}",
                        temp_path.display(),
                        path.display()
                    )
                })
            }
        }
    }
}

/// Async downloader with a bounded timeout, used only for file
/// materialization (sheet reads go through the blocking client).
#[derive(Debug, Clone)]
pub struct FileFetcher {
    client: reqwest::Client,
}

impl FileFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building download client")?;
        Ok(Self { client })
    }

    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let span = info_span!("file_fetch", url);
        async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            let final_url = response.url().to_string();
            if !status.is_success() {
                return Err(FetchError::HttpStatus {
                    status: status.as_u16(),
                    url: final_url,
                });
            }
            Ok(response.bytes().await?.to_vec())
        }
        .instrument(span)
        .await
    }
}

#[derive(Debug, Clone, Default)]
pub struct MaterializeOutcome {
    /// Path to store on the record: the fresh download, or the previous
    /// attachment when nothing could be fetched.
    pub path: Option<String>,
    pub downloaded: bool,
}

/// Resolve one record's file reference. `previous` is whatever path the
/// matched stored record carried before the replace.
pub async fn materialize(
    fetcher: &FileFetcher,
    store: &FileStore,
    title: &str,
    remote_url: Option<&str>,
    previous: Option<String>,
) -> MaterializeOutcome {
    let Some(remote_url) = remote_url else {
        return MaterializeOutcome {
            path: previous,
            downloaded: false,
        };
    };
    let Some(direct_url) = direct_download_url(remote_url) else {
        return MaterializeOutcome {
            path: previous,
            downloaded: false,
        };
    };

    let bytes = match fetcher.fetch_bytes(&direct_url).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(title, error = %err, "file download failed, keeping previous attachment");
            return MaterializeOutcome {
                path: previous,
                downloaded: false,
            };
        }
    };

    match store.write_bytes(title, &bytes).await {
        Ok(path) => {
            info!(title, path = %path.display(), "file materialized");
            MaterializeOutcome {
                path: Some(path.display().to_string()),
                downloaded: true,
            }
        }
        Err(err) => {
            warn!(title, error = %err, "storing downloaded file failed, keeping previous attachment");
            MaterializeOutcome {
                path: previous,
                downloaded: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn share_link_shapes_translate_to_direct_urls() {
        assert_eq!(
            direct_download_url("https://drive.google.com/file/d/abc_123-XYZ/view").as_deref(),
            Some("https://drive.google.com/uc?export=download&id=abc_123-XYZ")
        );
        assert_eq!(
            direct_download_url("https://drive.google.com/open?id=File42").as_deref(),
            Some("https://drive.google.com/uc?export=download&id=File42")
        );
        assert_eq!(
            direct_download_url("https://drive.google.com/d/short").as_deref(),
            Some("https://drive.google.com/uc?export=download&id=short")
        );
    }

    #[test]
    fn non_drive_urls_pass_through() {
        assert_eq!(
            direct_download_url("https://example.com/manual.pdf").as_deref(),
            Some("https://example.com/manual.pdf")
        );
    }

    #[test]
    fn unrecognized_drive_links_are_rejected() {
        assert_eq!(direct_download_url("https://drive.google.com/drive/folders"), None);
        assert_eq!(direct_download_url(""), None);
    }

    #[test]
    fn titles_become_safe_filenames() {
        assert_eq!(sanitize_title("Сервис: винная карта (v2)"), "Сервис винная карта v2");
        assert_eq!(sanitize_title("  wine_list  "), "wine_list");
    }

    /// One-shot HTTP server on a local socket, enough for the fetcher.
    async fn serve_once(status_line: &'static str, body: &'static [u8]) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut buf = [0u8; 1024];
            let _ = tokio::io::AsyncReadExt::read(&mut stream, &mut buf).await;
            let head = format!(
                "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).await.expect("head");
            stream.write_all(body).await.expect("body");
            stream.shutdown().await.expect("shutdown");
        });
        format!("http://{addr}/file.pdf")
    }

    #[tokio::test]
    async fn fetch_returns_body_bytes_on_success() {
        let url = serve_once("200 OK", b"pdf bytes").await;
        let fetcher = FileFetcher::new(Duration::from_secs(5)).expect("fetcher");
        let bytes = fetcher.fetch_bytes(&url).await.expect("fetch");
        assert_eq!(bytes, b"pdf bytes");
    }

    #[tokio::test]
    async fn fetch_classifies_non_success_status() {
        let url = serve_once("404 Not Found", b"missing").await;
        let fetcher = FileFetcher::new(Duration::from_secs(5)).expect("fetcher");
        match fetcher.fetch_bytes(&url).await {
            Err(FetchError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn write_is_atomic_and_deterministic() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());

        let first = store.write_bytes("Карта вин", b"v1").await.expect("first write");
        let second = store.write_bytes("Карта вин", b"v2").await.expect("second write");
        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).expect("read back"), b"v2");
        assert_eq!(store.path_for("Карта вин"), first);

        // no temp leftovers
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
