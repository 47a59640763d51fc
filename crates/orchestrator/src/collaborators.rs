//! Boundary contracts with the systems the pipeline drives.
//!
//! The orchestrator only sees these traits. Concrete topic sources, generators
//! and publishers live in [`crate::adapters`] or in the embedding application.

use async_trait::async_trait;
use autoblog_core::{Destination, Draft, ProgressEvent, PublishedArtifact, RunReport, Topic};
use uuid::Uuid;

use crate::error::{CollaboratorError, Result};

pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;

#[async_trait]
pub trait TopicSource: Send + Sync {
    async fn discover(&self, niche: Option<&str>) -> CollaboratorResult<Topic>;
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        topic: &Topic,
        niche: Option<&str>,
        account: Option<&str>,
    ) -> CollaboratorResult<Draft>;
}

/// Publishes a draft. Called at most once per run.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        draft: &Draft,
        destination: &Destination,
    ) -> CollaboratorResult<PublishedArtifact>;
}

/// Read-only view of configured credentials and publishing destinations.
///
/// Implementations must be safe to read while a run is in flight.
pub trait CredentialStore: Send + Sync {
    fn has_generation_credential(&self) -> bool;

    fn list_publish_destinations(&self) -> Vec<Destination>;
}

/// Receives the report of every finished run. Never consulted for decisions.
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn record(&self, report: &RunReport) -> Result<()>;
}

/// Display-only consumer of live progress.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, run_id: Uuid, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(Uuid, &ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, run_id: Uuid, event: &ProgressEvent) {
        self(run_id, event)
    }
}
