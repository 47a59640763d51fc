//! Pipeline orchestrator.
//!
//! Sequences the three stage executors for one run: gate, topic discovery,
//! content generation, publication. Each stage's output feeds the next, the
//! first failure stops the run, and every run ends with exactly one
//! [`PipelineOutcome`] inside a [`RunReport`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use autoblog_core::{
    Destination, Draft, FailureKind, FailureRecord, FailureStage, PipelineOutcome,
    PipelineRequest, PipelineStage, ProgressEvent, RunReport, RunSeed, Topic,
};
use chrono::Utc;
use events::{Event, EventBus};
use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::collaborators::{
    ContentGenerator, CredentialStore, HistorySink, ProgressObserver, Publisher, TopicSource,
};
use crate::core::{OrderedEventEmitter, StageContext, StageExecutor};
use crate::error::Result;
use crate::gate::{GateResult, PreconditionGate};
use crate::progress::{
    ProgressReporter, CONTENT_GENERATED, FINDING_TOPIC, GENERATING_CONTENT, PUBLISHED, PUBLISHING,
};
use crate::stages::{
    ContentInput, ContentStage, PublicationInput, PublicationStage, TopicInput, TopicStage,
};
use crate::state_machine::{RunState, RunStateMachine};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub topic_timeout: Duration,
    pub content_timeout: Duration,
    pub publish_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            topic_timeout: Duration::from_secs(60),
            content_timeout: Duration::from_secs(180),
            publish_timeout: Duration::from_secs(60),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topic_timeout(mut self, timeout: Duration) -> Self {
        self.topic_timeout = timeout;
        self
    }

    pub fn with_content_timeout(mut self, timeout: Duration) -> Self {
        self.content_timeout = timeout;
        self
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    pub fn timeout_for(&self, stage: PipelineStage) -> Duration {
        match stage {
            PipelineStage::Topic => self.topic_timeout,
            PipelineStage::Content => self.content_timeout,
            PipelineStage::Publication => self.publish_timeout,
        }
    }
}

/// Caller-side handle to a run: its id, cooperative cancellation and live
/// progress.
#[derive(Clone)]
pub struct RunHandle {
    run_id: Uuid,
    cancel: CancellationToken,
    progress: watch::Receiver<Option<ProgressEvent>>,
}

impl RunHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Request cancellation. Observed before the next stage starts; a stage
    /// already in flight (notably a publish call) is not interrupted.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn progress(&self) -> watch::Receiver<Option<ProgressEvent>> {
        self.progress.clone()
    }

    pub fn latest_progress(&self) -> Option<ProgressEvent> {
        self.progress.borrow().clone()
    }
}

/// A run that has an id, token and reporter but has not started yet.
pub struct PendingRun {
    id: Uuid,
    cancel: CancellationToken,
    reporter: ProgressReporter,
    emitter: Option<OrderedEventEmitter>,
}

impl PendingRun {
    pub fn handle(&self) -> RunHandle {
        RunHandle {
            run_id: self.id,
            cancel: self.cancel.clone(),
            progress: self.reporter.subscribe(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.id
    }
}

struct ActiveRun {
    id: Uuid,
    cancel: CancellationToken,
    reporter: ProgressReporter,
    emitter: Option<OrderedEventEmitter>,
    state: RunState,
    destination: Option<Destination>,
    topic: Option<Topic>,
    draft: Option<Draft>,
}

impl ActiveRun {
    fn new(run: PendingRun) -> Self {
        Self {
            id: run.id,
            cancel: run.cancel,
            reporter: run.reporter,
            emitter: run.emitter,
            state: RunState::Pending,
            destination: None,
            topic: None,
            draft: None,
        }
    }

    fn emit(&self, event: Event) {
        if let Some(ref emitter) = self.emitter {
            emitter.emit(event);
        }
    }

    fn advance(&mut self, to: RunState) -> Result<()> {
        let from = self.state;
        RunStateMachine::validate_transition(&from, &to)?;
        self.state = to;

        debug!(
            run_id = %self.id,
            from = from.as_str(),
            to = to.as_str(),
            "Run state transition"
        );
        self.emit(Event::RunStateChanged {
            run_id: self.id,
            from_state: from.as_str().to_string(),
            to_state: to.as_str().to_string(),
        });
        Ok(())
    }

    fn cancelled_before(&mut self, stage: PipelineStage) -> Result<Option<PipelineOutcome>> {
        if !self.cancel.is_cancelled() {
            return Ok(None);
        }
        info!(run_id = %self.id, before = %stage, "Run cancelled");
        self.advance(RunState::Cancelled)?;
        Ok(Some(PipelineOutcome::Cancelled { before: stage }))
    }

    fn skip(&self, stage: PipelineStage) {
        info!(run_id = %self.id, stage = %stage, "Stage skipped, output supplied by request");
        self.emit(Event::StageSkipped {
            run_id: self.id,
            stage: stage.as_str().to_string(),
        });
    }

    fn fail(&mut self, failure: FailureRecord) -> Result<PipelineOutcome> {
        self.advance(RunState::Failed)?;
        Ok(PipelineOutcome::Failure { failure })
    }

    fn failure_stage(&self) -> FailureStage {
        match self.state {
            RunState::DiscoveringTopic => FailureStage::Topic,
            RunState::GeneratingContent => FailureStage::Content,
            RunState::Publishing => FailureStage::Publication,
            _ => FailureStage::Precondition,
        }
    }
}

pub struct Orchestrator {
    gate: PreconditionGate,
    topic: TopicStage,
    content: ContentStage,
    publication: PublicationStage,
    config: PipelineConfig,
    event_bus: Option<EventBus>,
    observers: Vec<Arc<dyn ProgressObserver>>,
    history: Vec<Arc<dyn HistorySink>>,
}

impl Orchestrator {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        topics: Arc<dyn TopicSource>,
        generator: Arc<dyn ContentGenerator>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            gate: PreconditionGate::new(credentials),
            topic: TopicStage::new(topics),
            content: ContentStage::new(generator),
            publication: PublicationStage::new(publisher),
            config: PipelineConfig::default(),
            event_bus: None,
            observers: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_history(mut self, sink: Arc<dyn HistorySink>) -> Self {
        self.history.push(sink);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn gate(&self) -> &PreconditionGate {
        &self.gate
    }

    /// Evaluate preconditions without starting a run.
    pub fn check(&self, request: &PipelineRequest) -> GateResult {
        self.gate.check(request)
    }

    /// Allocate a run with its own reporter and cancellation token.
    pub fn new_run(&self) -> PendingRun {
        let id = Uuid::new_v4();
        let emitter = self.event_bus.clone().map(OrderedEventEmitter::new);

        let mut reporter = ProgressReporter::new(id).with_observers(self.observers.iter().cloned());
        if let Some(ref emitter) = emitter {
            reporter = reporter.with_observer(Arc::new(emitter.clone()));
        }

        PendingRun {
            id,
            cancel: CancellationToken::new(),
            reporter,
            emitter,
        }
    }

    /// Run the pipeline to completion on the current task.
    pub async fn execute(&self, request: PipelineRequest) -> RunReport {
        let run = self.new_run();
        self.execute_run(request, run).await
    }

    /// Spawn a run on the tokio runtime and return its handle immediately.
    pub fn start(self: &Arc<Self>, request: PipelineRequest) -> (RunHandle, JoinHandle<RunReport>) {
        let run = self.new_run();
        let handle = run.handle();
        let this = Arc::clone(self);
        let join = tokio::spawn(async move { this.execute_run(request, run).await });
        (handle, join)
    }

    pub async fn execute_run(&self, request: PipelineRequest, run: PendingRun) -> RunReport {
        let started_at = Utc::now();
        let mut active = ActiveRun::new(run);

        info!(
            run_id = %active.id,
            seed = request.seed.as_str(),
            niche = ?request.niche,
            account = ?request.account,
            "Pipeline run started"
        );
        active.emit(Event::RunStarted {
            run_id: active.id,
            seed: request.seed.as_str().to_string(),
            niche: request.niche.clone(),
        });

        let outcome = match self.drive(&request, &mut active).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(run_id = %active.id, error = %e, "Pipeline run aborted");
                PipelineOutcome::Failure {
                    failure: FailureRecord::new(
                        active.failure_stage(),
                        FailureKind::Rejected,
                        e.to_string(),
                    ),
                }
            }
        };

        match &outcome {
            PipelineOutcome::Success { artifact } => info!(
                run_id = %active.id,
                url = %artifact.external_url,
                "Pipeline run succeeded"
            ),
            PipelineOutcome::Failure { failure } => warn!(
                run_id = %active.id,
                stage = failure.stage.as_str(),
                kind = failure.kind.as_str(),
                retryable = failure.retryable,
                error = %failure.message,
                "Pipeline run failed"
            ),
            PipelineOutcome::Cancelled { before } => info!(
                run_id = %active.id,
                before = %before,
                "Pipeline run cancelled"
            ),
        }

        let emitter = active.emitter.take();
        let report = RunReport {
            run_id: active.id,
            started_at,
            finished_at: Utc::now(),
            niche: request.niche,
            account: request.account,
            destination: active.destination,
            topic: active.topic,
            draft: active.draft,
            progress: active.reporter.into_events(),
            outcome,
        };

        self.record(&report).await;

        if let Some(emitter) = emitter {
            emitter.emit(Event::RunFinished {
                run_id: report.run_id,
                outcome: report.outcome.as_str().to_string(),
                success: report.outcome.is_success(),
            });
        }

        report
    }

    async fn drive(
        &self,
        request: &PipelineRequest,
        run: &mut ActiveRun,
    ) -> Result<PipelineOutcome> {
        if let GateResult::Blocked { reasons } = self.gate.check(request) {
            let reasons: Vec<String> = reasons.into_iter().collect();
            warn!(run_id = %run.id, reasons = ?reasons, "Run blocked by preconditions");
            run.emit(Event::RunBlocked {
                run_id: run.id,
                reasons: reasons.clone(),
            });
            return run.fail(FailureRecord::precondition(reasons.join("; ")));
        }

        let destination = match self.gate.resolve_destination(request) {
            Ok(destination) => destination,
            Err(failure) => return run.fail(failure),
        };
        run.destination = Some(destination.clone());
        run.advance(RunState::Gated)?;

        let topic = match &request.seed {
            RunSeed::Discover => {
                if let Some(outcome) = run.cancelled_before(PipelineStage::Topic)? {
                    return Ok(outcome);
                }
                run.advance(RunState::DiscoveringTopic)?;
                run.reporter.report(FINDING_TOPIC);

                let input = TopicInput {
                    niche: request.niche.clone(),
                };
                match self.invoke(&self.topic, &input, run).await {
                    Ok(topic) => topic,
                    Err(failure) => return run.fail(failure),
                }
            }
            RunSeed::SuppliedTopic { topic } | RunSeed::SuppliedDraft { topic, .. } => {
                run.skip(PipelineStage::Topic);
                topic.clone()
            }
        };
        run.topic = Some(topic.clone());

        let draft = match &request.seed {
            RunSeed::SuppliedDraft { draft, .. } => {
                run.skip(PipelineStage::Content);
                draft.clone()
            }
            RunSeed::Discover | RunSeed::SuppliedTopic { .. } => {
                if let Some(outcome) = run.cancelled_before(PipelineStage::Content)? {
                    return Ok(outcome);
                }
                run.advance(RunState::GeneratingContent)?;
                run.reporter.report(GENERATING_CONTENT);

                let input = ContentInput {
                    topic,
                    niche: request.niche.clone(),
                    account: request.account.clone(),
                };
                match self.invoke(&self.content, &input, run).await {
                    Ok(draft) => {
                        run.reporter.report(CONTENT_GENERATED);
                        draft
                    }
                    Err(failure) => return run.fail(failure),
                }
            }
        };
        run.draft = Some(draft.clone());

        if let Some(outcome) = run.cancelled_before(PipelineStage::Publication)? {
            return Ok(outcome);
        }
        run.advance(RunState::Publishing)?;
        run.reporter.report(PUBLISHING);

        let input = PublicationInput { draft, destination };
        match self.invoke(&self.publication, &input, run).await {
            Ok(artifact) => {
                run.reporter.report(PUBLISHED);
                run.advance(RunState::Succeeded)?;
                Ok(PipelineOutcome::Success { artifact })
            }
            Err(failure) => run.fail(failure),
        }
    }

    async fn invoke<E: StageExecutor>(
        &self,
        executor: &E,
        input: &E::Input,
        run: &ActiveRun,
    ) -> std::result::Result<E::Output, FailureRecord> {
        let stage = executor.stage();
        let ctx = StageContext::new(run.id, self.config.timeout_for(stage));

        run.emit(Event::StageStarted {
            run_id: run.id,
            stage: stage.as_str().to_string(),
        });
        let started = Instant::now();

        let result = executor.run(input, &ctx).await;

        match &result {
            Ok(_) => run.emit(Event::StageCompleted {
                run_id: run.id,
                stage: stage.as_str().to_string(),
                duration_ms: started.elapsed().as_millis() as u64,
            }),
            Err(failure) => run.emit(Event::StageFailed {
                run_id: run.id,
                stage: stage.as_str().to_string(),
                kind: failure.kind.as_str().to_string(),
                retryable: failure.retryable,
                message: failure.message.clone(),
            }),
        }

        result
    }

    async fn record(&self, report: &RunReport) {
        let results = join_all(self.history.iter().map(|sink| sink.record(report))).await;
        for e in results.into_iter().filter_map(|r| r.err()) {
            warn!(run_id = %report.run_id, error = %e, "Failed to record run history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.timeout_for(PipelineStage::Topic), Duration::from_secs(60));
        assert_eq!(config.timeout_for(PipelineStage::Content), Duration::from_secs(180));
        assert_eq!(
            config.timeout_for(PipelineStage::Publication),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::new()
            .with_topic_timeout(Duration::from_secs(1))
            .with_content_timeout(Duration::from_secs(2))
            .with_publish_timeout(Duration::from_secs(3));

        assert_eq!(config.topic_timeout, Duration::from_secs(1));
        assert_eq!(config.content_timeout, Duration::from_secs(2));
        assert_eq!(config.publish_timeout, Duration::from_secs(3));
    }
}
