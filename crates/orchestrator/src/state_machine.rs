use crate::error::{OrchestratorError, Result};

/// Lifecycle of a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Pending,
    Gated,
    DiscoveringTopic,
    GeneratingContent,
    Publishing,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Gated => "gated",
            Self::DiscoveringTopic => "discovering_topic",
            Self::GeneratingContent => "generating_content",
            Self::Publishing => "publishing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

pub struct RunStateMachine;

impl RunStateMachine {
    pub fn validate_transition(from: &RunState, to: &RunState) -> Result<()> {
        let allowed = Self::allowed_transitions(from);

        if allowed.contains(to) {
            Ok(())
        } else {
            Err(OrchestratorError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    // Gated may jump past stages whose output the request supplied.
    // Publishing cannot be cancelled: a publish call is never interrupted.
    fn allowed_transitions(from: &RunState) -> Vec<RunState> {
        match from {
            RunState::Pending => vec![RunState::Gated, RunState::Failed],
            RunState::Gated => vec![
                RunState::DiscoveringTopic,
                RunState::GeneratingContent,
                RunState::Publishing,
                RunState::Cancelled,
                RunState::Failed,
            ],
            RunState::DiscoveringTopic => vec![
                RunState::GeneratingContent,
                RunState::Cancelled,
                RunState::Failed,
            ],
            RunState::GeneratingContent => vec![
                RunState::Publishing,
                RunState::Cancelled,
                RunState::Failed,
            ],
            RunState::Publishing => vec![RunState::Succeeded, RunState::Failed],
            RunState::Succeeded | RunState::Failed | RunState::Cancelled => vec![],
        }
    }

    pub fn can_transition(from: &RunState, to: &RunState) -> bool {
        Self::validate_transition(from, to).is_ok()
    }

    pub fn next_state(current: &RunState) -> Option<RunState> {
        match current {
            RunState::Pending => Some(RunState::Gated),
            RunState::Gated => Some(RunState::DiscoveringTopic),
            RunState::DiscoveringTopic => Some(RunState::GeneratingContent),
            RunState::GeneratingContent => Some(RunState::Publishing),
            RunState::Publishing => Some(RunState::Succeeded),
            RunState::Succeeded | RunState::Failed | RunState::Cancelled => None,
        }
    }
}
