use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One of the three ordered pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Topic,
    Content,
    Publication,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 3] = [Self::Topic, Self::Content, Self::Publication];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Content => "content",
            Self::Publication => "publication",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "topic" => Ok(Self::Topic),
            "content" => Ok(Self::Content),
            "publication" => Ok(Self::Publication),
            other => Err(CoreError::UnknownStage(other.to_string())),
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(stage label, percent complete)` pair reported while a run advances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ProgressEvent {
    pub stage_label: String,
    /// Always within `0..=100`
    pub percent: u8,
}

impl ProgressEvent {
    pub fn new(stage_label: impl Into<String>, percent: u8) -> Self {
        Self {
            stage_label: stage_label.into(),
            percent: percent.min(100),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.percent == 100
    }
}
