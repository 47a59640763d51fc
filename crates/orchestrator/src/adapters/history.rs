use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use autoblog_core::RunReport;
use tracing::info;

use crate::collaborators::HistorySink;
use crate::error::Result;
use crate::files::FileManager;

/// Appends every report to `.autoblog/history.jsonl`.
///
/// When a run ends without publishing but produced a draft, the draft is
/// also kept under `.autoblog/drafts/<run_id>.html` so it can be resumed.
#[derive(Debug, Clone)]
pub struct FileHistory {
    files: FileManager,
}

impl FileHistory {
    pub fn new(files: FileManager) -> Self {
        Self { files }
    }

    pub async fn read_all(&self) -> Result<Vec<RunReport>> {
        self.files.read_history().await
    }
}

#[async_trait]
impl HistorySink for FileHistory {
    async fn record(&self, report: &RunReport) -> Result<()> {
        self.files.append_history(report).await?;

        if !report.outcome.is_success() {
            if let Some(ref draft) = report.draft {
                let path = self.files.write_draft(report.run_id, draft).await?;
                info!(run_id = %report.run_id, path = %path.display(), "Kept draft of unpublished run");
            }
        }
        Ok(())
    }
}

/// In-memory history, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    reports: Mutex<Vec<RunReport>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<RunReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl HistorySink for MemoryHistory {
    async fn record(&self, report: &RunReport) -> Result<()> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoblog_core::{
        Draft, FailureKind, FailureRecord, FailureStage, PipelineOutcome, PublishedArtifact, Topic,
    };
    use chrono::Utc;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn report(outcome: PipelineOutcome, draft: Option<Draft>) -> RunReport {
        RunReport {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            niche: Some("tech".to_string()),
            account: None,
            destination: None,
            topic: Some(Topic::new("Rust", "hook")),
            draft,
            progress: Vec::new(),
            outcome,
        }
    }

    #[tokio::test]
    async fn test_file_history_keeps_unpublished_draft() {
        let temp = TempDir::new().unwrap();
        let files = FileManager::new(temp.path());
        let history = FileHistory::new(files.clone());

        let failed = report(
            PipelineOutcome::Failure {
                failure: FailureRecord::new(
                    FailureStage::Publication,
                    FailureKind::CredentialExpired,
                    "401",
                ),
            },
            Some(Draft::new("Title", "<p>Body</p>")),
        );
        history.record(&failed).await.unwrap();

        assert!(files.draft_exists(failed.run_id).await);
        let loaded = history.read_all().await.unwrap();
        assert_eq!(loaded, vec![failed]);
    }

    #[tokio::test]
    async fn test_file_history_success_has_no_draft_file() {
        let temp = TempDir::new().unwrap();
        let files = FileManager::new(temp.path());
        let history = FileHistory::new(files.clone());

        let ok = report(
            PipelineOutcome::Success {
                artifact: PublishedArtifact::new("1", "https://x"),
            },
            Some(Draft::new("Title", "<p>Body</p>")),
        );
        history.record(&ok).await.unwrap();

        assert!(!files.draft_exists(ok.run_id).await);
        assert_eq!(history.read_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_history() {
        let history = MemoryHistory::new();
        let r = report(
            PipelineOutcome::Cancelled {
                before: autoblog_core::PipelineStage::Content,
            },
            None,
        );
        history.record(&r).await.unwrap();
        assert_eq!(history.reports(), vec![r]);
    }
}
