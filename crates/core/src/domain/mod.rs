mod destination;
mod draft;
mod outcome;
mod progress;
mod request;
mod topic;

pub use destination::Destination;
pub use draft::{Draft, PublishedArtifact};
pub use outcome::{FailureKind, FailureRecord, FailureStage, PipelineOutcome, RunReport};
pub use progress::{PipelineStage, ProgressEvent};
pub use request::{PipelineRequest, RunSeed};
pub use topic::Topic;
