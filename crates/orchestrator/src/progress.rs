//! Per-run progress reporting.
//!
//! Each run owns its own [`ProgressReporter`]; concurrent runs never share
//! one. The reporter keeps the full event sequence for the final report,
//! publishes the latest event on a `watch` channel, and forwards every event to
//! the configured observers.

use std::sync::Arc;

use autoblog_core::ProgressEvent;
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::collaborators::ProgressObserver;

pub const FINDING_TOPIC: (&str, u8) = ("Finding trending topic...", 10);
pub const GENERATING_CONTENT: (&str, u8) = ("Generating content...", 40);
pub const CONTENT_GENERATED: (&str, u8) = ("Content generated!", 70);
pub const PUBLISHING: (&str, u8) = ("Publishing...", 85);
pub const PUBLISHED: (&str, u8) = ("Published successfully!", 100);

pub struct ProgressReporter {
    run_id: Uuid,
    events: Vec<ProgressEvent>,
    latest: watch::Sender<Option<ProgressEvent>>,
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl ProgressReporter {
    pub fn new(run_id: Uuid) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            run_id,
            events: Vec::new(),
            latest,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_observers<I>(mut self, observers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn ProgressObserver>>,
    {
        self.observers.extend(observers);
        self
    }

    /// Record a progress step. A percent lower than the last reported one is
    /// dropped so the sequence never regresses; returns whether it was kept.
    pub fn report(&mut self, (label, percent): (&str, u8)) -> bool {
        let event = ProgressEvent::new(label, percent);

        if let Some(last) = self.events.last() {
            if event.percent < last.percent {
                warn!(
                    run_id = %self.run_id,
                    last = last.percent,
                    attempted = event.percent,
                    "Dropping regressing progress event"
                );
                return false;
            }
        }

        debug!(
            run_id = %self.run_id,
            percent = event.percent,
            label = %event.stage_label,
            "Progress"
        );

        for observer in &self.observers {
            observer.on_progress(self.run_id, &event);
        }
        self.latest.send_replace(Some(event.clone()));
        self.events.push(event);
        true
    }

    pub fn latest(&self) -> Option<ProgressEvent> {
        self.events.last().cloned()
    }

    pub fn events(&self) -> &[ProgressEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<ProgressEvent> {
        self.events
    }

    /// Receiver that always holds the most recent event of this run.
    pub fn subscribe(&self) -> watch::Receiver<Option<ProgressEvent>> {
        self.latest.subscribe()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_report_sequence() {
        let mut reporter = ProgressReporter::new(Uuid::new_v4());
        assert!(reporter.latest().is_none());

        for step in [FINDING_TOPIC, GENERATING_CONTENT, CONTENT_GENERATED, PUBLISHING, PUBLISHED] {
            assert!(reporter.report(step));
        }

        let percents: Vec<u8> = reporter.events().iter().map(|e| e.percent).collect();
        assert_eq!(percents, vec![10, 40, 70, 85, 100]);
        assert_eq!(reporter.latest().unwrap().stage_label, "Published successfully!");
    }

    #[test]
    fn test_regression_dropped() {
        let mut reporter = ProgressReporter::new(Uuid::new_v4());
        assert!(reporter.report(CONTENT_GENERATED));
        assert!(!reporter.report(FINDING_TOPIC));
        assert_eq!(reporter.events().len(), 1);
        assert_eq!(reporter.latest().unwrap().percent, 70);
    }

    #[test]
    fn test_observers_receive_events() {
        let seen: Arc<Mutex<Vec<(Uuid, u8)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let run_id = Uuid::new_v4();

        let mut reporter = ProgressReporter::new(run_id).with_observer(Arc::new(
            move |id: Uuid, event: &ProgressEvent| {
                sink.lock().unwrap().push((id, event.percent));
            },
        ));
        reporter.report(FINDING_TOPIC);
        reporter.report(GENERATING_CONTENT);

        assert_eq!(*seen.lock().unwrap(), vec![(run_id, 10), (run_id, 40)]);
    }

    #[tokio::test]
    async fn test_watch_receiver_tracks_latest() {
        let mut reporter = ProgressReporter::new(Uuid::new_v4());
        let mut rx = reporter.subscribe();
        assert!(rx.borrow().is_none());

        reporter.report(PUBLISHING);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|e| e.percent), Some(85));
    }

    #[test]
    fn test_independent_reporters() {
        let mut a = ProgressReporter::new(Uuid::new_v4());
        let mut b = ProgressReporter::new(Uuid::new_v4());
        a.report(PUBLISHED);
        b.report(FINDING_TOPIC);

        assert_eq!(a.events().len(), 1);
        assert_eq!(b.latest().unwrap().percent, 10);
        assert_ne!(a.run_id(), b.run_id());
    }
}
