use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Destination, Draft, PipelineRequest, PipelineStage, ProgressEvent, PublishedArtifact, RunSeed, Topic};

/// Where a run failed. `Precondition` means no stage was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Precondition,
    Topic,
    Content,
    Publication,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Precondition => "precondition",
            Self::Topic => "topic",
            Self::Content => "content",
            Self::Publication => "publication",
        }
    }
}

impl From<PipelineStage> for FailureStage {
    fn from(stage: PipelineStage) -> Self {
        match stage {
            PipelineStage::Topic => Self::Topic,
            PipelineStage::Content => Self::Content,
            PipelineStage::Publication => Self::Publication,
        }
    }
}

/// Classification of a failure; decides whether a retry can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing credential or connected destination
    Precondition,
    /// Network error, rate limit or timeout before anything was committed
    Transient,
    /// Empty or malformed topic/draft
    InvalidInput,
    /// Publishing credential expired; retry after reconnecting the account
    CredentialExpired,
    /// Publication timed out and may have succeeded remotely
    AmbiguousOutcome,
    /// Definitive refusal by the collaborator
    Rejected,
}

impl FailureKind {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transient | Self::CredentialExpired | Self::AmbiguousOutcome
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Precondition => "precondition",
            Self::Transient => "transient",
            Self::InvalidInput => "invalid_input",
            Self::CredentialExpired => "credential_expired",
            Self::AmbiguousOutcome => "ambiguous_outcome",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct FailureRecord {
    pub stage: FailureStage,
    pub kind: FailureKind,
    pub message: String,
    pub retryable: bool,
}

impl FailureRecord {
    pub fn new(stage: FailureStage, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
            retryable: kind.is_retryable(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(FailureStage::Precondition, FailureKind::Precondition, message)
    }

    pub fn is_ambiguous(&self) -> bool {
        self.kind == FailureKind::AmbiguousOutcome
    }

    /// Text meant for the person running the pipeline. Credential expiry and
    /// ambiguous publication get their own wording instead of a generic error.
    pub fn user_message(&self) -> String {
        match self.kind {
            FailureKind::Precondition => format!("Setup required: {}", self.message),
            FailureKind::CredentialExpired => format!(
                "Publishing credentials have expired. Reconnect the account, then retry publication. ({})",
                self.message
            ),
            FailureKind::AmbiguousOutcome => format!(
                "Publishing timed out and the post may already be live. Check the destination before retrying to avoid a duplicate. ({})",
                self.message
            ),
            _ => format!("{} stage failed: {}", self.stage.as_str(), self.message),
        }
    }
}

impl std::fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}/{}] {}",
            self.stage.as_str(),
            self.kind.as_str(),
            self.message
        )
    }
}

/// Exactly one of these ends every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Success { artifact: PublishedArtifact },
    Failure { failure: FailureRecord },
    /// Cancellation was observed before `before` started.
    Cancelled { before: PipelineStage },
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn artifact(&self) -> Option<&PublishedArtifact> {
        match self {
            Self::Success { artifact } => Some(artifact),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureRecord> {
        match self {
            Self::Failure { failure } => Some(failure),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Failure { .. } => "failure",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}

/// Everything a caller gets back from one run.
///
/// Intermediate values produced before a downstream failure stay here so the
/// caller can inspect them, store them, or feed them into a retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub niche: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<Destination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<Draft>,
    #[serde(default)]
    pub progress: Vec<ProgressEvent>,
    pub outcome: PipelineOutcome,
}

impl RunReport {
    /// Request that re-enters at the failed stage, reusing completed work.
    ///
    /// Returns `None` when a retry is not advisable: success, cancellation,
    /// non-retryable failures and ambiguous publications.
    pub fn retry_request(&self) -> Option<PipelineRequest> {
        match &self.outcome {
            PipelineOutcome::Failure { failure } if failure.retryable && !failure.is_ambiguous() => {
                self.resume_request()
            }
            _ => None,
        }
    }

    /// Like [`retry_request`](Self::retry_request) but ignores the failure
    /// classification. Use after confirming an ambiguous publication did not
    /// go through, or to continue a cancelled run.
    pub fn resume_request(&self) -> Option<PipelineRequest> {
        match &self.outcome {
            PipelineOutcome::Success { .. } => return None,
            PipelineOutcome::Failure { failure } if failure.stage == FailureStage::Precondition => {
                return None
            }
            _ => {}
        }

        let seed = match (&self.topic, &self.draft) {
            (Some(topic), Some(draft)) => RunSeed::SuppliedDraft {
                topic: topic.clone(),
                draft: draft.clone(),
            },
            (Some(topic), None) => RunSeed::SuppliedTopic {
                topic: topic.clone(),
            },
            _ => RunSeed::Discover,
        };

        Some(PipelineRequest {
            niche: self.niche.clone(),
            account: self
                .destination
                .as_ref()
                .map(|d| d.id.clone())
                .or_else(|| self.account.clone()),
            seed,
        })
    }

    pub fn last_progress(&self) -> Option<&ProgressEvent> {
        self.progress.last()
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
