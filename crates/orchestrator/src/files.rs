//! File management for published posts, unpublished drafts and run history
//!
//! Everything lives under `.autoblog/` in the project directory:
//!
//! ```text
//! .autoblog/
//! ├── published/     posts written by the file publisher
//! ├── drafts/        drafts kept from runs that did not publish
//! └── history.jsonl  one RunReport per line
//! ```

use std::path::PathBuf;

use autoblog_core::{Draft, RunReport};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{OrchestratorError, Result};

/// Base directory for autoblog files
pub const STUDIO_DIR: &str = ".autoblog";
/// Directory for posts published to the local filesystem
const PUBLISHED_DIR: &str = "published";
/// Directory for drafts of failed or cancelled runs
const DRAFTS_DIR: &str = "drafts";
/// Append-only run history
const HISTORY_FILE: &str = "history.jsonl";

/// Manages post, draft and history files
#[derive(Debug, Clone)]
pub struct FileManager {
    /// Project directory containing `.autoblog/`
    base_path: PathBuf,
}

impl FileManager {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn studio_dir(&self) -> PathBuf {
        self.base_path.join(STUDIO_DIR)
    }

    pub fn published_dir(&self) -> PathBuf {
        self.studio_dir().join(PUBLISHED_DIR)
    }

    pub fn drafts_dir(&self) -> PathBuf {
        self.studio_dir().join(DRAFTS_DIR)
    }

    pub fn history_path(&self) -> PathBuf {
        self.studio_dir().join(HISTORY_FILE)
    }

    pub fn draft_path(&self, run_id: Uuid) -> PathBuf {
        self.drafts_dir().join(format!("{}.html", run_id))
    }

    /// Ensure all required directories exist
    pub async fn ensure_directories(&self) -> Result<()> {
        for dir in [self.published_dir(), self.drafts_dir()] {
            fs::create_dir_all(&dir).await.map_err(|e| {
                OrchestratorError::Storage(format!("Failed to create directory {:?}: {}", dir, e))
            })?;
        }
        Ok(())
    }

    /// Write a published post (atomic write via temp file + rename)
    pub async fn write_published(&self, file_name: &str, draft: &Draft) -> Result<PathBuf> {
        self.ensure_directories().await?;
        let path = self.published_dir().join(file_name);
        info!(path = %path.display(), "Writing published post");
        write_atomic(&path, &render_document(draft)).await?;
        Ok(path)
    }

    /// Keep the draft of a run that did not publish
    pub async fn write_draft(&self, run_id: Uuid, draft: &Draft) -> Result<PathBuf> {
        self.ensure_directories().await?;
        let path = self.draft_path(run_id);
        info!(path = %path.display(), "Saving unpublished draft");
        write_atomic(&path, &render_document(draft)).await?;
        Ok(path)
    }

    pub async fn read_draft(&self, run_id: Uuid) -> Result<String> {
        let path = self.draft_path(run_id);
        debug!(path = %path.display(), "Reading draft");
        fs::read_to_string(&path).await.map_err(|e| {
            OrchestratorError::Storage(format!("Failed to read draft {:?}: {}", path, e))
        })
    }

    pub async fn draft_exists(&self, run_id: Uuid) -> bool {
        fs::try_exists(self.draft_path(run_id)).await.unwrap_or(false)
    }

    /// Append one report to the history file
    pub async fn append_history(&self, report: &RunReport) -> Result<()> {
        fs::create_dir_all(self.studio_dir()).await?;
        let mut line = serde_json::to_string(report)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.history_path())
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(run_id = %report.run_id, "Run appended to history");
        Ok(())
    }

    /// All recorded runs, oldest first. Unreadable lines are skipped.
    pub async fn read_history(&self) -> Result<Vec<RunReport>> {
        let path = self.history_path();
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        let reports = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(index, line)| match serde_json::from_str(line) {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(line = index + 1, error = %e, "Skipping malformed history entry");
                    None
                }
            })
            .collect();
        Ok(reports)
    }
}

impl Default for FileManager {
    fn default() -> Self {
        Self::new(".")
    }
}

async fn write_atomic(path: &std::path::Path, content: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    fs::write(&temp_path, content).await.map_err(|e| {
        OrchestratorError::Storage(format!("Failed to write temp file {:?}: {}", temp_path, e))
    })?;
    fs::rename(&temp_path, path).await.map_err(|e| {
        OrchestratorError::Storage(format!(
            "Failed to rename {:?} -> {:?}: {}",
            temp_path, path, e
        ))
    })
}

/// Standalone HTML document for a draft.
pub fn render_document(draft: &Draft) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(&draft.title)));
    if let Some(ref excerpt) = draft.excerpt {
        html.push_str(&format!(
            "<meta name=\"description\" content=\"{}\">\n",
            escape_html(excerpt)
        ));
    }
    if !draft.labels.is_empty() {
        html.push_str(&format!(
            "<meta name=\"keywords\" content=\"{}\">\n",
            escape_html(&draft.labels.join(", "))
        ));
    }
    html.push_str("</head>\n<body>\n<article>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&draft.title)));
    if let Some(ref image) = draft.image_url {
        html.push_str(&format!("<img src=\"{}\" alt=\"\">\n", escape_html(image)));
    }
    html.push_str(&draft.body);
    html.push_str("\n</article>\n</body>\n</html>\n");
    html
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
