//! Domain types for the autoblog generation-and-publish pipeline.
//!
//! Every value here is created fresh for a single run and never mutated once
//! produced: a [`Topic`] feeds a [`Draft`], a [`Draft`] feeds a
//! [`PublishedArtifact`], and the run ends with exactly one [`PipelineOutcome`]
//! wrapped in a [`RunReport`].

pub mod domain;
pub mod error;

pub use domain::*;
pub use error::CoreError;
