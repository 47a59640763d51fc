pub mod adapters;
pub mod collaborators;
pub mod core;
pub mod credentials;
pub mod error;
pub mod files;
pub mod gate;
pub mod pipeline;
pub mod progress;
pub mod stages;
pub mod state_machine;

pub use collaborators::{
    CollaboratorResult, ContentGenerator, CredentialStore, HistorySink, ProgressObserver,
    Publisher, TopicSource,
};
pub use credentials::{CredentialSnapshot, SnapshotCredentialStore};
pub use error::{CollaboratorError, OrchestratorError, Result};
pub use files::FileManager;
pub use gate::{GateResult, PreconditionGate};
pub use pipeline::{Orchestrator, PendingRun, PipelineConfig, RunHandle};
pub use progress::ProgressReporter;
pub use state_machine::{RunState, RunStateMachine};
