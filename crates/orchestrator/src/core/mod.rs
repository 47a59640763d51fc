//! Core abstractions for the pipeline execution model.
//!
//! - [`StageExecutor`] - Trait each of the three stages implements
//! - [`StageContext`] - Per-call run data (run id, timeout)
//! - [`bounded`] - Timeout + classification wrapper around a collaborator call
//! - [`OrderedEventEmitter`] - Per-run event emitter with sequence numbers

mod events;
mod execution;
mod stage;

pub use events::OrderedEventEmitter;
pub use execution::{bounded, classify};
pub use stage::{StageContext, StageExecutor};
