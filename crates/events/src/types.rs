//! Event types for the autoblog event system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// All possible events in the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    // Run lifecycle
    /// A pipeline run was accepted and is about to check preconditions
    #[serde(rename = "run.started")]
    RunStarted {
        run_id: Uuid,
        seed: String,
        niche: Option<String>,
    },

    /// The precondition gate refused the run
    #[serde(rename = "run.blocked")]
    RunBlocked { run_id: Uuid, reasons: Vec<String> },

    /// Run state machine moved
    #[serde(rename = "run.state_changed")]
    RunStateChanged {
        run_id: Uuid,
        from_state: String,
        to_state: String,
    },

    /// Run ended; exactly one per run
    #[serde(rename = "run.finished")]
    RunFinished {
        run_id: Uuid,
        outcome: String,
        success: bool,
    },

    // Stage events
    /// A stage executor was invoked
    #[serde(rename = "stage.started")]
    StageStarted { run_id: Uuid, stage: String },

    /// A stage was bypassed because the request supplied its output
    #[serde(rename = "stage.skipped")]
    StageSkipped { run_id: Uuid, stage: String },

    /// A stage executor returned successfully
    #[serde(rename = "stage.completed")]
    StageCompleted {
        run_id: Uuid,
        stage: String,
        duration_ms: u64,
    },

    /// A stage executor returned a classified failure
    #[serde(rename = "stage.failed")]
    StageFailed {
        run_id: Uuid,
        stage: String,
        kind: String,
        retryable: bool,
        message: String,
    },

    /// Progress update for display
    #[serde(rename = "run.progress")]
    Progress {
        run_id: Uuid,
        sequence: u64,
        stage_label: String,
        percent: u8,
    },
}

impl Event {
    /// Get the run ID associated with this event, if any
    pub fn run_id(&self) -> Option<Uuid> {
        match self {
            Event::RunStarted { run_id, .. } => Some(*run_id),
            Event::RunBlocked { run_id, .. } => Some(*run_id),
            Event::RunStateChanged { run_id, .. } => Some(*run_id),
            Event::RunFinished { run_id, .. } => Some(*run_id),
            Event::StageStarted { run_id, .. } => Some(*run_id),
            Event::StageSkipped { run_id, .. } => Some(*run_id),
            Event::StageCompleted { run_id, .. } => Some(*run_id),
            Event::StageFailed { run_id, .. } => Some(*run_id),
            Event::Progress { run_id, .. } => Some(*run_id),
        }
    }

    /// Whether this event closes a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::RunFinished { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_envelope_creation() {
        let event = Event::RunStarted {
            run_id: Uuid::new_v4(),
            seed: "discover".to_string(),
            niche: None,
        };
        let envelope = EventEnvelope::new(event);

        assert!(!envelope.id.is_nil());
        assert!(envelope.timestamp <= Utc::now());
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::Progress {
            run_id: Uuid::new_v4(),
            sequence: 3,
            stage_label: "Publishing...".to_string(),
            percent: 85,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("run.progress"));
        assert!(json.contains("stage_label"));
        assert!(json.contains("85"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"stage.skipped","run_id":"550e8400-e29b-41d4-a716-446655440000","stage":"topic"}"#;
        let event: Event = serde_json::from_str(json).unwrap();

        match event {
            Event::StageSkipped { run_id, stage } => {
                assert_eq!(stage, "topic");
                assert!(!run_id.is_nil());
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn test_event_run_id() {
        let run_id = Uuid::new_v4();

        let event = Event::StageStarted {
            run_id,
            stage: "content".to_string(),
        };
        assert_eq!(event.run_id(), Some(run_id));
        assert!(!event.is_terminal());

        let finished = Event::RunFinished {
            run_id,
            outcome: "success".to_string(),
            success: true,
        };
        assert!(finished.is_terminal());
    }

    #[test]
    fn test_every_event_belongs_to_a_run() {
        let untagged = serde_json::json!({"type": "error", "message": "boom", "context": null});
        assert!(serde_json::from_value::<Event>(untagged).is_err());
    }
}
