//! Ordered event emitter with sequence guarantees.
//!
//! One emitter is created per run so the sequence numbers attached to
//! progress events are local to that run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use autoblog_core::ProgressEvent;
use events::{Event, EventBus, EventEnvelope};
use uuid::Uuid;

use crate::collaborators::ProgressObserver;

/// Event emitter with sequence number guarantees.
///
/// Wraps an EventBus and numbers progress events so subscribers can detect
/// gaps caused by a lagging receiver.
#[derive(Clone)]
pub struct OrderedEventEmitter {
    bus: EventBus,
    sequence: Arc<AtomicU64>,
}

impl OrderedEventEmitter {
    /// Create a new ordered event emitter wrapping the given bus.
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event on the bus.
    pub fn emit(&self, event: Event) {
        self.bus.publish(EventEnvelope::new(event));
    }

    /// Emit a progress event carrying the next sequence number.
    pub fn emit_progress(&self, run_id: Uuid, progress: &ProgressEvent) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.emit(Event::Progress {
            run_id,
            sequence,
            stage_label: progress.stage_label.clone(),
            percent: progress.percent,
        });
    }

    /// Get the current sequence number (for debugging/testing).
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Get a reference to the underlying event bus.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

impl ProgressObserver for OrderedEventEmitter {
    fn on_progress(&self, run_id: Uuid, event: &ProgressEvent) {
        self.emit_progress(run_id, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_increments_on_progress_only() {
        let bus = EventBus::new();
        let emitter = OrderedEventEmitter::new(bus);
        let run_id = Uuid::new_v4();

        assert_eq!(emitter.current_sequence(), 0);

        emitter.emit_progress(run_id, &ProgressEvent::new("Finding trending topic...", 10));
        assert_eq!(emitter.current_sequence(), 1);

        emitter.emit(Event::StageStarted {
            run_id,
            stage: "topic".to_string(),
        });
        assert_eq!(emitter.current_sequence(), 1);
        assert_eq!(emitter.bus().event_count(), 2);
    }

    #[tokio::test]
    async fn test_progress_reaches_subscribers_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let emitter = OrderedEventEmitter::new(bus);
        let run_id = Uuid::new_v4();

        emitter.on_progress(run_id, &ProgressEvent::new("a", 10));
        emitter.on_progress(run_id, &ProgressEvent::new("b", 40));

        for expected in [0u64, 1] {
            match rx.recv().await.unwrap().event {
                Event::Progress { sequence, .. } => assert_eq!(sequence, expected),
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[test]
    fn test_separate_emitters_have_separate_sequences() {
        let bus = EventBus::new();
        let first = OrderedEventEmitter::new(bus.clone());
        let second = OrderedEventEmitter::new(bus);

        first.emit_progress(Uuid::new_v4(), &ProgressEvent::new("a", 10));
        assert_eq!(first.current_sequence(), 1);
        assert_eq!(second.current_sequence(), 0);
    }
}
