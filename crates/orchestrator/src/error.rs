use autoblog_core::{FailureKind, PipelineStage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid run state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Run task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Error returned by an external collaborator (topic source, content
/// generator, publisher). The stage executor boundary turns it into a
/// classified `FailureRecord`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("Transient provider error: {0}")]
    Transient(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Credentials expired for destination {destination}: {message}")]
    CredentialExpired {
        destination: String,
        message: String,
    },

    #[error("Rejected: {0}")]
    Rejected(String),

    /// The request may have been applied remotely but no confirmation came back.
    #[error("Outcome unknown: {0}")]
    AmbiguousOutcome(String),
}

impl CollaboratorError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn credential_expired(destination: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CredentialExpired {
            destination: destination.into(),
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    pub fn ambiguous(message: impl Into<String>) -> Self {
        Self::AmbiguousOutcome(message.into())
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Transient(_) | Self::RateLimited(_) => FailureKind::Transient,
            Self::InvalidInput(_) => FailureKind::InvalidInput,
            Self::CredentialExpired { .. } => FailureKind::CredentialExpired,
            Self::Rejected(_) => FailureKind::Rejected,
            Self::AmbiguousOutcome(_) => FailureKind::AmbiguousOutcome,
        }
    }
}

/// Kind assigned when a stage call exceeds its timeout. A publish call may
/// have landed server-side, so that one is ambiguous rather than transient.
pub fn timeout_kind(stage: PipelineStage) -> FailureKind {
    match stage {
        PipelineStage::Topic | PipelineStage::Content => FailureKind::Transient,
        PipelineStage::Publication => FailureKind::AmbiguousOutcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_error_kinds() {
        assert_eq!(
            CollaboratorError::transient("503").failure_kind(),
            FailureKind::Transient
        );
        assert_eq!(
            CollaboratorError::RateLimited("429".to_string()).failure_kind(),
            FailureKind::Transient
        );
        assert_eq!(
            CollaboratorError::invalid_input("empty").failure_kind(),
            FailureKind::InvalidInput
        );
        assert_eq!(
            CollaboratorError::credential_expired("blog-1", "401").failure_kind(),
            FailureKind::CredentialExpired
        );
        assert_eq!(
            CollaboratorError::rejected("403").failure_kind(),
            FailureKind::Rejected
        );
        assert_eq!(
            CollaboratorError::ambiguous("connection reset after send").failure_kind(),
            FailureKind::AmbiguousOutcome
        );
    }

    #[test]
    fn test_timeout_kind_per_stage() {
        assert_eq!(timeout_kind(PipelineStage::Topic), FailureKind::Transient);
        assert_eq!(timeout_kind(PipelineStage::Content), FailureKind::Transient);
        assert_eq!(
            timeout_kind(PipelineStage::Publication),
            FailureKind::AmbiguousOutcome
        );
    }

    #[test]
    fn test_error_display() {
        let err = CollaboratorError::credential_expired("blog-1", "token revoked");
        assert_eq!(
            err.to_string(),
            "Credentials expired for destination blog-1: token revoked"
        );
    }
}
