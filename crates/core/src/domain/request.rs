use serde::{Deserialize, Serialize};

use super::{Draft, PipelineStage, Topic};

/// Where a run enters the pipeline.
///
/// Bypass paths are explicit variants rather than inferred from which optional
/// fields happen to be present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RunSeed {
    /// Discover a trending topic first.
    #[default]
    Discover,
    /// Skip discovery and generate content for this topic.
    SuppliedTopic { topic: Topic },
    /// Skip discovery and generation, publish this draft.
    SuppliedDraft { topic: Topic, draft: Draft },
}

impl RunSeed {
    /// The first stage that will actually run for this seed.
    pub fn entry_stage(&self) -> PipelineStage {
        match self {
            Self::Discover => PipelineStage::Topic,
            Self::SuppliedTopic { .. } => PipelineStage::Content,
            Self::SuppliedDraft { .. } => PipelineStage::Publication,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discover => "discover",
            Self::SuppliedTopic { .. } => "supplied_topic",
            Self::SuppliedDraft { .. } => "supplied_draft",
        }
    }
}

/// Input to one pipeline run. Absent selectors mean "let the downstream
/// collaborator choose".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct PipelineRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub niche: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default)]
    pub seed: RunSeed,
}

impl PipelineRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_niche(mut self, niche: impl Into<String>) -> Self {
        self.niche = Some(niche.into());
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn with_topic(mut self, topic: Topic) -> Self {
        self.seed = RunSeed::SuppliedTopic { topic };
        self
    }

    pub fn with_draft(mut self, topic: Topic, draft: Draft) -> Self {
        self.seed = RunSeed::SuppliedDraft { topic, draft };
        self
    }
}
